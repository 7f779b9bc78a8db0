use canonlr::{
    canonical_collection, closure, goto,
    grammar::{examples, NonterminalID, TerminalID, TerminalSet, EPSILON},
    Grammar, GrammarDef, Item, ItemSet, ParseTable,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn augmented(f: fn(&mut GrammarDef)) -> Grammar {
    Grammar::define(|g| {
        f(g);
        g.augment(true);
    })
    .unwrap()
}

fn sorted(g: &Grammar, set: &TerminalSet) -> Vec<String> {
    let mut names: Vec<_> = set.iter().map(|t| g.terminal_name(t).to_owned()).collect();
    names.sort();
    names
}

fn first(g: &Grammar, name: &str) -> Vec<String> {
    let first = g.first_of_name(name);
    let mut names = sorted(g, first.terminals());
    if first.contains_epsilon() {
        names.push(EPSILON.to_owned());
    }
    names
}

fn follow(g: &Grammar, name: &str) -> Vec<String> {
    sorted(g, &g.follow_of_name(name))
}

fn item(g: &Grammar, head: &str, rule: usize, dot: usize, lookahead: &str) -> Item {
    Item::new(
        g.nonterminal(head).unwrap(),
        rule,
        dot,
        g.terminal(lookahead).unwrap(),
    )
}

#[test]
fn expression_grammar() {
    init_tracing();
    let g = Grammar::define(examples::expression).unwrap();
    tracing::info!("\n{}", g);

    for name in ["E", "T", "F"] {
        assert_eq!(first(&g, name), ["(", "id"]);
    }
    assert_eq!(follow(&g, "E"), [")", "+", "⊣"]);
    assert_eq!(follow(&g, "T"), [")", "*", "+", "⊣"]);
    assert_eq!(follow(&g, "F"), [")", "*", "+", "⊣"]);
}

#[test]
fn nullable_cascade() {
    init_tracing();
    let g = Grammar::define(examples::nullable_cascade).unwrap();

    assert_eq!(first(&g, "A"), ["a", EPSILON]);
    assert_eq!(first(&g, "B"), ["b", EPSILON]);
    assert_eq!(first(&g, "S"), ["a", "b", "c"]);
    assert_eq!(follow(&g, "A"), ["b", "c"]);
    assert_eq!(follow(&g, "B"), ["c"]);
}

#[test]
fn augmented_start() {
    init_tracing();
    let g = Grammar::build("S", [("S", vec![vec!["a"]])], true).unwrap();

    assert!(g.is_augmented());
    assert_eq!(g.start_symbol(), NonterminalID::START);
    assert_eq!(g.nonterminal_name(g.start_symbol()), "S'");
    assert_eq!(follow(&g, "S'"), ["⊣"]);
    assert_eq!(follow(&g, "S"), ["⊣"]);
}

#[test]
fn lr1_closure() {
    init_tracing();
    let g = augmented(examples::cc);
    let seed: ItemSet = Some(Item::new(NonterminalID::START, 0, 0, TerminalID::EOI))
        .into_iter()
        .collect();
    let i0 = closure(&g, &seed).unwrap();
    tracing::info!("\n{}", i0.display(&g));

    for expected in [
        item(&g, "S", 0, 0, "⊣"),
        item(&g, "C", 0, 0, "c"),
        item(&g, "C", 0, 0, "d"),
        item(&g, "C", 1, 0, "c"),
        item(&g, "C", 1, 0, "d"),
    ] {
        assert!(i0.contains(&expected), "{}", expected.display(&g));
    }
    assert_eq!(i0.len(), 6);
}

#[test]
fn goto_transition() {
    init_tracing();
    let g = augmented(examples::cc);
    let seed: ItemSet = Some(Item::new(NonterminalID::START, 0, 0, TerminalID::EOI))
        .into_iter()
        .collect();
    let i0 = closure(&g, &seed).unwrap();
    let next = goto(&g, &i0, g.symbol("C").unwrap()).unwrap();

    let expected: ItemSet = [
        item(&g, "S", 0, 1, "⊣"),
        item(&g, "C", 0, 0, "⊣"),
        item(&g, "C", 1, 0, "⊣"),
    ]
    .into_iter()
    .collect();
    assert_eq!(next, expected);
}

#[test]
fn canonical_collection_size() {
    init_tracing();
    let g = augmented(examples::cc);
    let automaton = canonical_collection(&g).unwrap();
    tracing::info!("\n{}", automaton.display(&g));
    assert_eq!(automaton.len(), 10);
}

#[test]
fn generated_table_parses_input() {
    init_tracing();
    let g = augmented(examples::expression);
    let automaton = canonical_collection(&g).unwrap();
    let table = ParseTable::generate(&g, &automaton);
    assert!(table.is_consistent());

    let tree = table
        .parse(&g, ["id", "+", "id", "*", "(", "id", ")"])
        .unwrap();
    tracing::info!("\n{}", tree.display(&g));
    assert!(table.parse(&g, ["id", "+"]).is_err());
}
