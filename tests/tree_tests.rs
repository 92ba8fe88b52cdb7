use taxwick::error::TaxError;
use taxwick::lineage::Lineage;
use taxwick::model::{LinkChange, TaxTree};
use taxwick::newick::parse_str;

#[test]
fn test_building_tree() {
    let mut tree = TaxTree::new();
    let l1 = tree.add_node("Pukeko".into(), Some(1.0));
    let l2 = tree.add_node("Takahe".into(), Some(1.0));
    let l3 = tree.add_node("Weka".into(), Some(0.5));
    let inner = tree.add_node(String::new(), Some(1.5));
    tree.attach_child(inner, l1);
    tree.attach_child(inner, l2);
    let root = tree.add_node(String::new(), None);
    tree.attach_child(root, l3);
    tree.attach_child(root, inner);
    tree.set_root(root);

    // Counts
    assert_eq!(tree.num_leaves(), 3);
    assert_eq!(tree.num_nodes(), 5);
    assert_eq!(tree.internal_nodes(), vec![root, inner]);
    assert_eq!(tree.leaves(), vec![l3, l1, l2]);

    // Root
    assert_eq!(tree.root().index(), root);
    assert!(tree.root().parent().is_none());
    assert!(tree.is_rooted());

    // Links
    assert_eq!(tree[l2].parent(), Some(inner));
    assert_eq!(tree.ancestors(l2), vec![inner, root]);
    assert_eq!(tree.descendants_of(inner), vec![l1, l2]);
    assert_eq!(tree[inner].branch_length, Some(1.5));
    assert!(tree.is_valid());
}

#[test]
#[should_panic]
fn test_get_root_panics_on_empty_tree() {
    let tree = TaxTree::new();
    tree.root(); // Should panic
}

#[test]
#[should_panic]
fn test_get_node_out_of_bounds() {
    let tree = TaxTree::new();
    let _ = &tree[55];
}

#[test]
fn test_apply_links_and_validity() {
    let mut tree = parse_str("((A,B),C,D);").unwrap();
    let root = tree.root_index();
    let ab = tree.root().children()[0];
    let c = tree.root().children()[1];

    // Moving C below (A,B) keeps the tree valid
    tree.apply_links(&[
        LinkChange::Detach { parent: root, child: c },
        LinkChange::Attach { parent: ab, child: c },
    ]);
    assert!(tree.is_valid());
    assert_eq!(tree[ab].children().len(), 3);

    // A node with a single child is not
    let d = tree.root().children()[1];
    tree.detach_child(root, d);
    assert!(!tree.is_valid());
}

#[test]
fn test_set_leaf_lineages() {
    let mut tree = parse_str("((A,B),C);").unwrap();
    let lineages = vec![
        Lineage::new("<D>X<T>A"),
        Lineage::new("<D>Unclassified<T>B"),
        Lineage::new("<D>X<T>C"),
    ];
    tree.set_leaf_lineages(&lineages).unwrap();

    let leaves = tree.leaves();
    assert_eq!(tree[leaves[0]].lineage, "<D>X<T>A");
    assert!(!tree[leaves[0]].unclassified);
    assert!(tree[leaves[1]].unclassified);
    assert_eq!((tree[leaves[1]].nleaf, tree[leaves[1]].nxleaf), (0, 1));

    let result = tree.set_leaf_lineages(&lineages[..2]);
    assert!(matches!(
        result,
        Err(TaxError::LineageCount { expected: 3, actual: 2 })
    ));
}

#[test]
fn test_root_moves_keep_leaves_and_total_length() {
    let mut tree = parse_str("(A:1,B:2,(C:3,(D:4,E:5):6):7);").unwrap();
    let total = |tree: &TaxTree| -> f64 {
        tree.descendants()
            .into_iter()
            .map(|i| tree[i].branch_length.unwrap_or(0.0))
            .sum()
    };
    let mut names = tree.leaf_names();
    names.sort();

    let d = tree.leaves()[3];
    tree.reroot_at(d);
    assert!((total(&tree) - 28.0).abs() < 1e-12);

    tree.force_root(0.05);
    assert!(tree.is_rooted());
    assert!((total(&tree) - 28.0).abs() < 1e-12);

    tree.unroot();
    assert!(!tree.is_rooted());
    assert!((total(&tree) - 28.0).abs() < 1e-12);

    tree.compact();
    assert!(tree.is_valid());
    assert_eq!(tree.root_index(), 0);
    let mut after = tree.leaf_names();
    after.sort();
    assert_eq!(after, names);
}
