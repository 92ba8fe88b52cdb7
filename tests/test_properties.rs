use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use taxwick::lineage::{self, RankTableBuilder};
use taxwick::model::{NodeIndex, TaxTree};
use taxwick::rooting::RootingConfig;
use taxwick::{classify_tree, parse_newick_str};

/// Lookup entries drawn for the leaves; `None` leaves the leaf unresolved.
const LINEAGE_POOL: [Option<&str>; 6] = [
    Some("<D>X<K>Y"),
    Some("<D>X<K>Y"),
    Some("<D>X<K>Z"),
    Some("<D>W<K>V"),
    Some("<D>Unclassified<K>Q"),
    None,
];

fn subtree_strategy() -> impl Strategy<Value = String> {
    let leaf = (0.01f64..5.0).prop_map(|length| format!("L:{length}"));
    leaf.prop_recursive(4, 24, 3, |inner| {
        (proptest::collection::vec(inner, 2..4), 0.01f64..5.0)
            .prop_map(|(children, length)| format!("({}):{length}", children.join(",")))
    })
}

/// Newick string with leaves `L0`, `L1`, ... and the lookup for them.
fn labelled_strategy() -> impl Strategy<Value = (String, HashMap<String, String>)> {
    (
        proptest::collection::vec(subtree_strategy(), 3..5),
        proptest::collection::vec(0..LINEAGE_POOL.len(), 16),
    )
        .prop_map(|(children, picks)| {
            let shape = format!("({});", children.join(","));
            let mut newick = String::with_capacity(shape.len() * 2);
            let mut lookup = HashMap::new();
            let mut count = 0;
            for c in shape.chars() {
                if c != 'L' {
                    newick.push(c);
                    continue;
                }
                let name = format!("L{count}");
                if let Some(found) = LINEAGE_POOL[picks[count % picks.len()]] {
                    lookup.insert(name.clone(), found.to_string());
                }
                newick.push_str(&name);
                count += 1;
            }
            (newick, lookup)
        })
}

/// Resolved leaves below `index`, including `index` itself if it is a leaf.
fn resolved_leaves(tree: &TaxTree, index: NodeIndex) -> BTreeSet<NodeIndex> {
    std::iter::once(index)
        .chain(tree.descendants_of(index))
        .filter(|&i| tree[i].is_leaf() && !tree[i].unclassified)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_monophyly_matches_leaf_sets((newick, lookup) in labelled_strategy()) {
        let ranks = RankTableBuilder::new().with_output_ranks("DK").lock().unwrap();
        let tree = parse_newick_str(&newick).unwrap();
        let classified = classify_tree(tree, &lookup, &ranks, &RootingConfig::default()).unwrap();
        let tree = &classified.tree;
        prop_assert!(tree.is_valid());
        prop_assert!(tree.is_rooted());

        let branches: Vec<BTreeSet<NodeIndex>> = tree
            .pre_order_iter()
            .map(|n| resolved_leaves(tree, n.index()))
            .collect();

        for (taxon, state) in &classified.taxa.def.state {
            let members: BTreeSet<NodeIndex> = tree
                .leaves()
                .into_iter()
                .filter(|&leaf| {
                    !tree[leaf].unclassified
                        && lineage::prefixes(&tree[leaf].lineage).contains(&taxon.as_str())
                })
                .collect();
            let monophyletic = branches.iter().any(|branch| *branch == members);

            prop_assert_eq!(state.n_strain, members.len(), "{}", taxon);
            prop_assert_eq!(state.monophy, monophyletic, "{}", taxon);
            prop_assert_eq!(state.monophy, state.distract.len() == 1, "{}", taxon);
        }
    }
}
