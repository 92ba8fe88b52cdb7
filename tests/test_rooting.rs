use proptest::prelude::*;
use taxwick::lineage::Lineage;
use taxwick::model::TaxTree;
use taxwick::newick::{NewickStyle, parse_str, to_newick};
use taxwick::rooting::{Criterion, Rooting, RootingConfig, RootingEngine};

const ALL_CRITERIA: [Criterion; 5] = [
    Criterion::MinimalAncestorDeviation,
    Criterion::PairwiseMidpoint,
    Criterion::MinimalDepth,
    Criterion::MinimalDepthPositive,
    Criterion::MinimalVariance,
];

const Y_A: &str = "<D>X<K>Y<T>A";
const Y_B: &str = "<D>X<K>Y<T>B";
const Z_C: &str = "<D>X<K>Z<T>C";
const Z_D: &str = "<D>X<K>Z<T>D";
const W_E: &str = "<D>X<K>W<T>E";
const W_F: &str = "<D>X<K>W<T>F";

fn labelled(newick: &str, lineages: &[&str]) -> TaxTree {
    let mut tree = parse_str(newick).unwrap();
    let lineages: Vec<Lineage> = lineages.iter().map(|l| Lineage::new(*l)).collect();
    tree.set_leaf_lineages(&lineages).unwrap();
    tree
}

fn leaf_names_below(tree: &TaxTree, index: usize) -> Vec<String> {
    let mut names: Vec<String> = if tree[index].is_leaf() {
        vec![tree[index].name.clone()]
    } else {
        tree.descendants_of(index)
            .into_iter()
            .filter(|&i| tree[i].is_leaf())
            .map(|i| tree[i].name.clone())
            .collect()
    };
    names.sort();
    names
}

// --- TESTS OUTGROUP ---
#[test]
fn test_root_by_outgroup() {
    let mut tree = parse_str("(A:1,B:1,(C:1,D:1):1);").unwrap();
    let engine = RootingEngine::default();

    let rooting = engine.root_by_outgroup(&mut tree, "'C'");
    assert!(rooting.is_applied());
    assert!(tree.is_rooted());
    assert!(tree.is_valid());
    assert_eq!(tree.num_leaves(), 4);

    let root = tree.root();
    assert_eq!(rooting.root(), Some(root.index()));
    let [outgroup, rest] = root.children()[..] else {
        panic!("root should be binary");
    };
    assert_eq!(tree[outgroup].name, "C");
    assert!((tree[outgroup].branch_length.unwrap() - 0.95).abs() < 1e-12);
    assert!((tree[rest].branch_length.unwrap() - 0.05).abs() < 1e-12);
    assert_eq!(leaf_names_below(&tree, rest), vec!["A", "B", "D"]);
}

#[test]
fn test_root_by_outgroup_matches_lineage_name() {
    let mut tree = labelled(
        "(a:1,b:1,c:1);",
        &["<D>X<K>Y<T>Aquifex aeolicus", "<D>X<K>Y<T>b", "<D>X<K>Z<T>c"],
    );
    let engine = RootingEngine::default();

    assert!(engine.root_by_outgroup(&mut tree, "Aquifex aeolicus").is_applied());
    let outgroup = tree.root().children()[0];
    assert_eq!(tree[outgroup].name, "a");
}

#[test]
fn test_missing_outgroup_leaves_tree_untouched() {
    let newick = "(A:1,B:1,(C:1,D:1):1);";
    let mut tree = parse_str(newick).unwrap();
    let engine = RootingEngine::default();

    let rooting = engine.root_by_outgroup(&mut tree, "Z");
    assert!(matches!(rooting, Rooting::NotApplicable(_)));
    assert_eq!(rooting.root(), None);
    assert_eq!(
        to_newick(NewickStyle::Plain, &tree),
        to_newick(NewickStyle::Plain, &parse_str(newick).unwrap())
    );
}

#[test]
fn test_missing_outgroup_falls_through() {
    let mut tree = parse_str("(A:1,B:1,(C:1,D:1):1);").unwrap();
    let engine = RootingEngine::new(RootingConfig::default().with_outgroup("Z"));

    let root = engine.root(&mut tree).unwrap();
    assert_eq!(root, tree.root_index());
    assert!(tree.is_rooted());
    assert_eq!(tree.num_leaves(), 4);
}

#[test]
fn test_rooted_tree_is_kept() {
    let newick = "((A:1,B:1):1,(C:1,D:1):1);";
    let mut tree = parse_str(newick).unwrap();
    let engine = RootingEngine::new(RootingConfig::default().with_outgroup("A"));

    let root = engine.root(&mut tree).unwrap();
    assert_eq!(root, tree.root_index());
    assert_eq!(
        to_newick(NewickStyle::Plain, &tree),
        "((A:1.00000,B:1.00000):1.00000,(C:1.00000,D:1.00000):1.00000);"
    );
}

// --- TESTS TAXONOMY ---
#[test]
fn test_root_by_taxonomy_separates_coherent_branch() {
    let mut tree = labelled(
        "(A:1,B:1,C:1);",
        &["<D>X<K>Y<T>A", "<D>X<K>Y<T>B", "<D>X<K>Z<T>C"],
    );
    let engine = RootingEngine::default();

    assert!(engine.root_by_taxonomy(&mut tree).is_applied());
    assert!(tree.is_rooted());
    assert!(tree.is_valid());

    let root = tree.root();
    assert_eq!(root.label, "<D>X");
    let [c, ab] = root.children()[..] else {
        panic!("root should be binary");
    };
    assert_eq!(tree[c].name, "C");
    assert_eq!(tree[ab].label, "<D>X<K>Y");
    assert_eq!(leaf_names_below(&tree, ab), vec!["A", "B"]);
}

#[test]
fn test_rebalance_marks_boundary_taxa() {
    let mut tree = labelled(
        "(A:1,B:1,(C:1,D:1):1);",
        &["<D>X<K>Y<T>A", "<D>X<K>Y<T>B", "<D>X<K>Z<T>C", "<D>X<K>Z<T>D"],
    );
    let engine = RootingEngine::default();

    assert!(engine.root_by_taxonomy(&mut tree).is_applied());
    let root = tree.root();
    let [first, second] = root.children()[..] else {
        panic!("root should be binary");
    };
    assert_eq!(leaf_names_below(&tree, first), vec!["C", "D"]);
    assert_eq!(leaf_names_below(&tree, second), vec!["A", "B"]);
    assert!(tree[first].otu);
    assert!(tree[second].otu);

    let total = tree[first].branch_length.unwrap() + tree[second].branch_length.unwrap();
    assert!((total - 1.0).abs() < 1e-12);
}

#[test]
fn test_taxonomy_not_applicable_without_resolved_leaves() {
    let mut tree = labelled(
        "(A:1,B:1,C:1);",
        &[
            "<D>Unclassified<T>A",
            "<D>Unclassified<T>B",
            "<D>Unclassified<T>C",
        ],
    );
    let engine = RootingEngine::default();
    assert!(matches!(engine.root_by_taxonomy(&mut tree), Rooting::NotApplicable(_)));
    assert_eq!(tree.root().children().len(), 3);
}

#[test]
fn test_root_by_taxonomy_picks_first_smallest_candidate() {
    // Neither the root nor (AB,CD) is a clade, so AB and CD are candidates
    let mut tree = labelled(
        "(E:1,F:1,((A:1,B:1):1,(C:1,D:1):1):1);",
        &[W_E, W_F, Y_A, Y_B, Z_C, Z_D],
    );
    let engine = RootingEngine::new(RootingConfig::default().with_rebalance(false));

    assert!(engine.root_by_taxonomy(&mut tree).is_applied());
    assert!(tree.is_valid());
    let [outgroup, rest] = tree.root().children()[..] else {
        panic!("root should be binary");
    };
    assert_eq!(leaf_names_below(&tree, outgroup), vec!["A", "B"]);
    assert_eq!(leaf_names_below(&tree, rest), vec!["C", "D", "E", "F"]);
    assert!((tree[outgroup].branch_length.unwrap() - 0.5).abs() < 1e-12);
    assert!((tree[rest].branch_length.unwrap() - 0.5).abs() < 1e-12);
    assert_eq!(
        to_newick(NewickStyle::Plain, &tree),
        "((A:1.00000,B:1.00000):0.50000,((E:1.00000,F:1.00000):1.00000,(C:1.00000,D:1.00000):1.00000):0.50000);"
    );
}

#[test]
fn test_root_by_taxonomy_tie_goes_to_first_in_pre_order() {
    let mut tree = labelled(
        "(E:1,F:1,((C:1,D:1):1,(A:1,B:1):1):1);",
        &[W_E, W_F, Z_C, Z_D, Y_A, Y_B],
    );
    let engine = RootingEngine::new(RootingConfig::default().with_rebalance(false));

    assert!(engine.root_by_taxonomy(&mut tree).is_applied());
    let outgroup = tree.root().children()[0];
    assert_eq!(leaf_names_below(&tree, outgroup), vec!["C", "D"]);
}

#[test]
fn test_root_by_taxonomy_prefers_fewer_leaves() {
    let mut tree = labelled(
        "(E:1,F:1,((A:1,B:1,G:1):1,(C:1,D:1):1):1);",
        &[W_E, W_F, Y_A, Y_B, "<D>X<K>Y<T>G", Z_C, Z_D],
    );
    let engine = RootingEngine::new(RootingConfig::default().with_rebalance(false));

    assert!(engine.root_by_taxonomy(&mut tree).is_applied());
    let [outgroup, rest] = tree.root().children()[..] else {
        panic!("root should be binary");
    };
    assert_eq!(leaf_names_below(&tree, outgroup), vec!["C", "D"]);
    assert_eq!(leaf_names_below(&tree, rest), vec!["A", "B", "E", "F", "G"]);
}

#[test]
fn test_root_by_taxonomy_splits_off_most_divergent_branch() {
    // AB is the chosen outgroup but CD shares no rank with EF and is split off
    let mut tree = labelled(
        "(E:1,F:1,((A:1,B:1):1,(C:1,D:2):2):1);",
        &[
            W_E,
            W_F,
            "<D>X<K>W<P>Q<T>A",
            "<D>X<K>W<P>Q<T>B",
            "<D>V<K>U<T>C",
            "<D>V<K>U<T>D",
        ],
    );
    let engine = RootingEngine::new(RootingConfig::default().with_rebalance(false));

    assert!(engine.root_by_taxonomy(&mut tree).is_applied());
    assert!(tree.is_valid());
    let [outgroup, rest] = tree.root().children()[..] else {
        panic!("root should be binary");
    };
    assert_eq!(leaf_names_below(&tree, outgroup), vec!["C", "D"]);
    assert_eq!(tree[outgroup].label, "<D>V<K>U");
    assert_eq!(leaf_names_below(&tree, rest), vec!["A", "B", "E", "F"]);
    assert!((tree[outgroup].branch_length.unwrap() - 1.0).abs() < 1e-12);
    assert!((tree[rest].branch_length.unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn test_root_by_taxonomy_leaves_single_leaf_untouched() {
    let mut tree = labelled("A:1;", &["<D>X<K>Y<T>A"]);
    let before = to_newick(NewickStyle::Plain, &tree);
    let engine = RootingEngine::default();

    assert!(matches!(engine.root_by_taxonomy(&mut tree), Rooting::NotApplicable(_)));
    assert_eq!(to_newick(NewickStyle::Plain, &tree), before);
    assert_eq!(tree.root().label, "<D>X<K>Y<T>A");
}

#[test]
fn test_rebalance_boundary_rank_symbol() {
    let lineages = ["<D>X<K>Y<T>A", "<D>X<K>Y<T>B", "<D>X<K>Z<T>C", "<D>X<K>Z<T>D"];
    let newick = "(A:1,B:1,(C:1,D:1):1);";

    // Kingdom is the default boundary below a domain-level root
    let mut tree = labelled(newick, &lineages);
    let engine = RootingEngine::new(RootingConfig::default().with_boundary_rank('K'));
    assert!(engine.root_by_taxonomy(&mut tree).is_applied());
    let [first, second] = tree.root().children()[..] else {
        panic!("root should be binary");
    };
    assert!(tree[first].otu && tree[second].otu);

    // Phylum lies below both kingdoms, so neither is a boundary taxon
    let mut tree = labelled(newick, &lineages);
    let engine = RootingEngine::new(RootingConfig::default().with_boundary_rank('P'));
    assert!(engine.root_by_taxonomy(&mut tree).is_applied());
    let [first, second] = tree.root().children()[..] else {
        panic!("root should be binary");
    };
    assert!(!tree[first].otu && !tree[second].otu);

    // Unknown symbols fall back to the default boundary
    let mut tree = labelled(newick, &lineages);
    let engine = RootingEngine::new(RootingConfig::default().with_boundary_rank('Z'));
    assert!(engine.root_by_taxonomy(&mut tree).is_applied());
    let [first, second] = tree.root().children()[..] else {
        panic!("root should be binary");
    };
    assert!(tree[first].otu && tree[second].otu);
}

// --- TESTS BRANCH LENGTHS ---
#[test]
fn test_root_by_length_uses_long_branch() {
    for criterion in [Criterion::MinimalAncestorDeviation, Criterion::MinimalDepth] {
        let mut tree = parse_str("(A:1,B:1,C:10);").unwrap();
        let engine = RootingEngine::new(RootingConfig::default().with_criterion(criterion));

        assert!(engine.root_by_length(&mut tree).is_applied());
        let [c, ab] = tree.root().children()[..] else {
            panic!("root should be binary");
        };
        assert_eq!(tree[c].name, "C");
        assert!((tree[c].branch_length.unwrap() - 5.5).abs() < 1e-9, "{criterion}");
        assert!((tree[ab].branch_length.unwrap() - 4.5).abs() < 1e-9, "{criterion}");
    }
}

#[test]
fn test_root_by_length_needs_three_leaves() {
    let mut tree = parse_str("(A:1,B:1);").unwrap();
    let engine = RootingEngine::default();
    assert!(!engine.root_by_length(&mut tree).is_applied());
}

#[test]
fn test_rooting_is_deterministic() {
    let newick = "(A:0.3,B:1.2,(C:0.7,(D:0.1,E:2.5):0.4):0.9,(F:1.1,G:0.2):0.6);";
    for criterion in ALL_CRITERIA {
        let engine = RootingEngine::new(RootingConfig::default().with_criterion(criterion));
        let mut first = parse_str(newick).unwrap();
        let mut second = parse_str(newick).unwrap();
        engine.root(&mut first).unwrap();
        engine.root(&mut second).unwrap();
        assert_eq!(
            to_newick(NewickStyle::Plain, &first),
            to_newick(NewickStyle::Plain, &second)
        );
    }
}

// --- PROPERTIES ---
fn subtree_strategy() -> impl Strategy<Value = String> {
    let leaf = (0.01f64..5.0).prop_map(|length| format!("L:{length}"));
    leaf.prop_recursive(4, 32, 3, |inner| {
        (proptest::collection::vec(inner, 2..4), 0.01f64..5.0)
            .prop_map(|(children, length)| format!("({}):{length}", children.join(",")))
    })
}

fn unrooted_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec(subtree_strategy(), 3..5)
        .prop_map(|children| format!("({});", children.join(",")))
}

proptest! {
    #[test]
    fn test_every_strategy_converges_to_binary_root(newick in unrooted_strategy()) {
        let leaves = parse_str(&newick).unwrap().num_leaves();

        for criterion in ALL_CRITERIA {
            let engine = RootingEngine::new(RootingConfig::default().with_criterion(criterion));
            let mut tree = parse_str(&newick).unwrap();
            prop_assert!(engine.root_by_length(&mut tree).is_applied());
            prop_assert!(tree.is_rooted());
            prop_assert!(tree.is_valid());
            prop_assert_eq!(tree.num_leaves(), leaves);
        }

        let engine = RootingEngine::default();
        let mut tree = parse_str(&newick).unwrap();
        prop_assert!(engine.force_root(&mut tree).is_applied());
        prop_assert!(tree.is_rooted());
        prop_assert!(tree.is_valid());

        let mut tree = parse_str(&newick).unwrap();
        prop_assert!(engine.root_by_outgroup(&mut tree, "L").is_applied());
        prop_assert!(tree.is_rooted());
        prop_assert!(tree.is_valid());
        prop_assert_eq!(tree.num_leaves(), leaves);
    }
}
