//! Fixtures and store property checks shared by the integration tests.
//!
//! The checks take a [`KnowledgeStore`] so the same assertions run against
//! the in-memory backend and PostgreSQL.

#![allow(dead_code)]

use migrant::models::{
    component_id, ColumnDef, Component, ComponentKind, ComponentNode, DependencyEdge, Metadata,
    TableSchema, USES,
};
use migrant::store::KnowledgeStore;
use serde_json::json;

pub const DIM: usize = 4;

pub fn metadata(methods: &[&str], dependencies: &[&str]) -> Metadata {
    let value = json!({
        "methods": methods,
        "properties": [],
        "dependencies": dependencies,
    });
    value.as_object().cloned().unwrap()
}

pub fn component(path: &str, name: &str, kind: ComponentKind, embedding: [f32; DIM]) -> Component {
    Component {
        id: component_id(path),
        name: name.to_string(),
        kind,
        namespace: "Legacy.Shop".to_string(),
        file_path: path.to_string(),
        code_content: format!("public class {} {{ }}", name),
        embedding: embedding.to_vec(),
        metadata: metadata(&[], &[]),
    }
}

pub fn node(id: &str, name: &str, kind: ComponentKind) -> ComponentNode {
    ComponentNode {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        namespace: "Legacy.Shop".to_string(),
        file_path: format!("src/{}.cs", name),
        metadata: Metadata::new(),
    }
}

pub fn column(name: &str, data_type: &str) -> ColumnDef {
    ColumnDef {
        name: name.to_string(),
        data_type: data_type.to_string(),
        nullable: false,
        max_length: None,
    }
}

/// Same id upserted twice: one row reflecting the second write, in every store.
pub async fn check_idempotent_upsert(store: &KnowledgeStore, prefix: &str) {
    let path = format!("{}/OrderController.cs", prefix);
    let mut first = component(&path, "OrderController", ComponentKind::Controller, [1.0, 0.0, 0.0, 0.0]);
    first.metadata = metadata(&["Index"], &[]);
    store.vectors.add_code_vector(&first).await.unwrap();

    let mut second = first.clone();
    second.metadata = metadata(&["Index", "Details"], &["OrderService"]);
    second.embedding = vec![0.0, 1.0, 0.0, 0.0];
    store.vectors.add_code_vector(&second).await.unwrap();

    let stored = store
        .vectors
        .get_component_by_id(&first.id)
        .await
        .unwrap()
        .expect("component stored");
    assert_eq!(stored.metadata, second.metadata);
    assert_eq!(stored.embedding, second.embedding);

    let listed = store
        .vectors
        .list_components(&[ComponentKind::Controller])
        .await
        .unwrap();
    assert_eq!(listed.iter().filter(|c| c.id == first.id).count(), 1);

    // Graph node
    let mut n = node(&first.id, "OrderController", ComponentKind::Controller);
    store.graph.create_component_node(&n).await.unwrap();
    n.namespace = "Legacy.Shop.Web".into();
    store.graph.create_component_node(&n).await.unwrap();
    let nodes = store.graph.nodes(&[first.id.clone()]).await.unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].namespace, "Legacy.Shop.Web");

    // Schema entry
    let table_name = format!("{}Orders", prefix);
    store
        .schema
        .add_table_schema(&TableSchema::new("dbo", &table_name, vec![column("Id", "int")]))
        .await
        .unwrap();
    store
        .schema
        .add_table_schema(&TableSchema::new(
            "dbo",
            &table_name,
            vec![column("Id", "int"), column("Total", "decimal")],
        ))
        .await
        .unwrap();
    let table = store.schema.get_table_schema(&table_name).await.unwrap().unwrap();
    assert_eq!(table.columns.len(), 2);
    let matches = store.schema.search_tables_by_keyword(&table_name).await.unwrap();
    assert_eq!(matches.len(), 1);
}

/// At most `min(top_k, N)` results, distances non-decreasing, kind filter honored.
pub async fn check_similarity_search(store: &KnowledgeStore, prefix: &str) {
    let query = [1.0, 0.0, 0.0, 0.0];
    assert!(store
        .vectors
        .search_similar_code(&query, 5, Some(ComponentKind::Model))
        .await
        .unwrap()
        .is_empty());

    let rows = [
        ("Far", [0.0, 0.0, 1.0, 0.0], ComponentKind::Service),
        ("Near", [1.0, 0.1, 0.0, 0.0], ComponentKind::Service),
        ("Exact", [2.0, 0.0, 0.0, 0.0], ComponentKind::Repository),
        ("Middle", [1.0, 1.0, 0.0, 0.0], ComponentKind::Service),
    ];
    for (name, embedding, kind) in rows {
        let c = component(&format!("{}/{}.cs", prefix, name), name, kind, embedding);
        store.vectors.add_code_vector(&c).await.unwrap();
    }

    let hits = store.vectors.search_similar_code(&query, 3, None).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    assert_eq!(hits[0].component.name, "Exact");
    assert_eq!(hits[1].component.name, "Near");
    assert!(hits[0].distance.abs() < 1e-6);

    let services = store
        .vectors
        .search_similar_code(&query, 10, Some(ComponentKind::Service))
        .await
        .unwrap();
    let names: Vec<&str> = services.iter().map(|h| h.component.name.as_str()).collect();
    assert_eq!(names, vec!["Near", "Middle", "Far"]);

    let err = store
        .vectors
        .search_similar_code(&[1.0, 0.0], 3, None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("dimension mismatch"));
}

/// Zero-norm vectors on either side rank at distance 1.0.
pub async fn check_zero_norm_search(store: &KnowledgeStore, prefix: &str) {
    let rows = [
        ("Blank", [0.0, 0.0, 0.0, 0.0]),
        ("Aligned", [1.0, 0.0, 0.0, 0.0]),
        ("Opposite", [-1.0, 0.0, 0.0, 0.0]),
    ];
    for (name, embedding) in rows {
        let c = component(
            &format!("{}/{}.cs", prefix, name),
            name,
            ComponentKind::Service,
            embedding,
        );
        store.vectors.add_code_vector(&c).await.unwrap();
    }

    let hits = store
        .vectors
        .search_similar_code(&[0.0; DIM], 10, None)
        .await
        .unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|h| (h.distance - 1.0).abs() < 1e-9));

    let hits = store
        .vectors
        .search_similar_code(&[1.0, 0.0, 0.0, 0.0], 10, None)
        .await
        .unwrap();
    let ranked: Vec<(&str, f64)> = hits
        .iter()
        .map(|h| (h.component.name.as_str(), h.distance))
        .collect();
    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0].0, "Aligned");
    assert_eq!(ranked[1].0, "Blank");
    assert!((ranked[1].1 - 1.0).abs() < 1e-9);
    assert_eq!(ranked[2].0, "Opposite");

    let blank = store
        .vectors
        .get_component_by_id(&component_id(&format!("{}/Blank.cs", prefix)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(blank.embedding, vec![0.0; DIM]);
}

/// Edge to a missing node is accepted and invisible until the node exists.
pub async fn check_dangling_edges(store: &KnowledgeStore, prefix: &str) {
    let from = component_id(&format!("{}/Controller.cs", prefix));
    let to = component_id(&format!("{}/Missing.cs", prefix));
    store
        .graph
        .create_component_node(&node(&from, "InvoiceController", ComponentKind::Controller))
        .await
        .unwrap();
    store
        .graph
        .create_dependency(&DependencyEdge::new(&from, &to, USES))
        .await
        .unwrap();

    assert!(store.graph.get_dependencies(&from, 1).await.unwrap().is_empty());
    assert!(store.graph.get_dependencies(&from, 3).await.unwrap().is_empty());

    store
        .graph
        .create_component_node(&node(&to, "InvoiceService", ComponentKind::Service))
        .await
        .unwrap();
    let deps = store.graph.get_dependencies(&from, 1).await.unwrap();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].name, "InvoiceService");
    assert_eq!(deps[0].dependency_type, USES);

    let dependents = store.graph.get_dependents(&to).await.unwrap();
    assert_eq!(dependents.len(), 1);
    assert_eq!(dependents[0].id, from);
}

/// Chain A -> B -> C -> D: depth 1 sees B, depth 2 sees B and C, never D.
pub async fn check_bounded_traversal(store: &KnowledgeStore, prefix: &str) {
    let ids: Vec<String> = ["A", "B", "C", "D"]
        .iter()
        .map(|n| component_id(&format!("{}/{}.cs", prefix, n)))
        .collect();
    for (id, name) in ids.iter().zip(["A", "B", "C", "D"]) {
        store
            .graph
            .create_component_node(&node(id, name, ComponentKind::Service))
            .await
            .unwrap();
    }
    for pair in ids.windows(2) {
        store
            .graph
            .create_dependency(&DependencyEdge::new(&pair[0], &pair[1], USES))
            .await
            .unwrap();
    }
    // Back edge D -> A must not loop.
    store
        .graph
        .create_dependency(&DependencyEdge::new(&ids[3], &ids[0], USES))
        .await
        .unwrap();

    let names = |deps: Vec<migrant::models::DependencyDescriptor>| -> Vec<String> {
        deps.into_iter().map(|d| d.name).collect()
    };

    assert_eq!(names(store.graph.get_dependencies(&ids[0], 1).await.unwrap()), vec!["B"]);
    assert_eq!(
        names(store.graph.get_dependencies(&ids[0], 2).await.unwrap()),
        vec!["B", "C"]
    );
    let all = store.graph.get_dependencies(&ids[0], 10).await.unwrap();
    assert_eq!(names(all.clone()), vec!["B", "C", "D"]);
    assert!(all.iter().all(|d| d.dependency_type == "DEPENDS_ON" && d.strength == 1.0));
    assert!(store.graph.get_dependencies(&ids[0], 0).await.unwrap().is_empty());
}

/// Direct dependencies come back strongest first.
pub async fn check_strength_ordering(store: &KnowledgeStore, prefix: &str) {
    let hub = component_id(&format!("{}/Hub.cs", prefix));
    store
        .graph
        .create_component_node(&node(&hub, "Hub", ComponentKind::Controller))
        .await
        .unwrap();
    for (name, strength) in [("Weak", 0.5), ("Strong", 3.0), ("Default", 1.0)] {
        let id = component_id(&format!("{}/{}.cs", prefix, name));
        store
            .graph
            .create_component_node(&node(&id, name, ComponentKind::Service))
            .await
            .unwrap();
        store
            .graph
            .create_dependency(&DependencyEdge::new(&hub, &id, USES).with_strength(strength))
            .await
            .unwrap();
    }

    let deps = store.graph.get_dependencies(&hub, 1).await.unwrap();
    let names: Vec<&str> = deps.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Strong", "Default", "Weak"]);

    let err = store
        .graph
        .create_dependency(&DependencyEdge::new(&hub, "x", USES).with_strength(-1.0))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Invalid dependency strength"));
}

/// Five columns stored and read back in order.
pub async fn check_schema_round_trip(store: &KnowledgeStore, prefix: &str) {
    let name = format!("{}Customer", prefix);
    let columns = vec![
        column("Id", "int"),
        column("FirstName", "nvarchar"),
        column("LastName", "nvarchar"),
        column("Email", "varchar"),
        column("CreatedAt", "datetime2"),
    ];
    store
        .schema
        .add_table_schema(&TableSchema::new("sales", &name, columns.clone()))
        .await
        .unwrap();

    let table = store.schema.get_table_schema(&name).await.unwrap().unwrap();
    assert_eq!(table.schema_name, "sales");
    assert_eq!(table.columns, columns);
    assert!(store
        .schema
        .get_table_schema(&name.to_lowercase())
        .await
        .unwrap()
        .is_none());
}

/// Table `Orders` with column `CustomerId` is found by "customer".
pub async fn check_keyword_search(store: &KnowledgeStore, prefix: &str) {
    let orders = format!("{}Orders", prefix);
    store
        .schema
        .add_table_schema(&TableSchema::new(
            "dbo",
            &orders,
            vec![column("Id", "int"), column("CustomerId", "int")],
        ))
        .await
        .unwrap();
    store
        .schema
        .add_table_schema(&TableSchema::new("dbo", &format!("{}Audit", prefix), vec![column("Id", "int")]))
        .await
        .unwrap();

    let hits = store.schema.search_tables_by_keyword("customer").await.unwrap();
    assert!(hits.iter().any(|t| t.table_name == orders));
    assert!(hits.iter().all(|t| !t.table_name.ends_with("Audit")));

    let by_name = store
        .schema
        .search_tables_by_keyword(&prefix.to_uppercase())
        .await
        .unwrap();
    assert!(by_name.iter().any(|t| t.table_name == orders));

    let err = store.schema.search_tables_by_keyword("(").await.unwrap_err();
    assert!(err.to_string().contains("Invalid search pattern"));
}
