//! Export/import inversion: generated headers parse back to the tree
//! positions they denote, and rendered files re-import losslessly.


use mock_services::{MemoryLoader, MemorySearch};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use pattern_core::prelude::*;
use pattern_core::tree::TreeValue;
use pattern_service::{Importer, Transcoder, headers, value_at, xlsx};
use pattern_service::csv;

fn ident(field: &str) -> String {
    format!("{field}{}", path::IDENTIFIER_SUFFIX)
}

fn record(value: Value) -> Mapping {
    match serde_json::from_value::<TreeValue>(value).expect("valid tree") {
        TreeValue::Mapping(mapping) => mapping,
        other => panic!("expected mapping, got {other:?}"),
    }
}

#[test]
fn test_headers_invert_through_transcoding() {
    let lines = ExportPattern::new("Lines", "sale.order.line")
        .with_field(PatternField::new("product_code", RelationKind::Scalar))
        .with_field(PatternField::new("qty", RelationKind::Scalar));
    let pattern = ExportPattern::new("Sales", "sale.order")
        .with_field(PatternField::new("name", RelationKind::Scalar).with_key())
        .with_field(PatternField::new("partner_id/vat", RelationKind::Many2one))
        .with_field(
            PatternField::new("order_line", RelationKind::One2many)
                .with_occurrence(2)
                .with_sub_pattern(lines),
        );

    let generated = headers(&pattern, false).expect("headers");
    assert_eq!(generated, vec![
        ident("name"),
        "partner_id|vat".to_string(),
        "order_line|1|product_code".to_string(),
        "order_line|1|qty".to_string(),
        "order_line|2|product_code".to_string(),
        "order_line|2|qty".to_string(),
    ]);

    let values = vec![
        json!("SO1"),
        json!("FR123"),
        json!("A"),
        json!(2),
        json!("B"),
        json!(1),
    ];
    let row: FlatRow = generated
        .iter()
        .cloned()
        .zip(values.iter().cloned())
        .collect();

    let registry = SchemaRegistry::new().with_model("sale.order", ModelSchema::new());
    let search = MemorySearch::new();
    let transcoder = Transcoder::new("sale.order", &registry, &search);
    let tree = transcoder.transcode(&row).expect("transcodes");

    // Every generated header reads back the value it carried.
    for (header, value) in generated.iter().zip(&values) {
        assert_eq!(value_at(&tree, header), Some(value), "header {header}");
    }
}

#[test]
fn test_xlsx_export_reimports_losslessly() {
    let pattern = ExportPattern::new("Partners", "res.partner")
        .with_field(PatternField::new("vat", RelationKind::Scalar).with_key())
        .with_field(PatternField::new("name", RelationKind::Scalar))
        .with_field(PatternField::new("country_id/code", RelationKind::Many2one));
    let records = vec![
        record(json!({"vat": "FR123", "name": "Acme", "country_id": {"code": "FR"}})),
        record(json!({"vat": "BE999", "name": "Newco", "country_id": {"code": "BE"}})),
    ];

    let search = MemorySearch::new().with_record("res.partner", 42, json!({"vat": "FR123"}));
    let bytes = xlsx::write_workbook(&pattern, &records, &search).expect("writes");
    let rows = xlsx::read_rows(&bytes).expect("reads back");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get(&ident("vat")), Some(&json!("FR123")));

    let registry = SchemaRegistry::new().with_model(
        "res.partner",
        ModelSchema::new()
            .with_field("vat", FieldDef::scalar())
            .with_field("name", FieldDef::scalar())
            .with_field("country_id", FieldDef::many2one("res.country")),
    );
    let importer =
        Importer::new(&pattern, &registry, &search, ImportConfig::default()).expect("valid");
    let mut loader = MemoryLoader::default();
    let result = importer.run(rows, &mut loader).expect("runs");

    assert!(result.is_success());
    assert_eq!(result.imported, 2);
    assert_eq!(
        serde_json::to_value(&loader.records[0].1).expect("serializes"),
        json!({"name": "Acme", "country_id": {"code": "FR"}, ".id": 42})
    );
    assert_eq!(
        serde_json::to_value(&loader.records[1].1).expect("serializes"),
        json!({"vat": "BE999", "name": "Newco", "country_id": {"code": "BE"}})
    );
}

#[test]
fn test_csv_export_reimports_losslessly() {
    let pattern = ExportPattern::new("Partners", "res.partner")
        .with_field(PatternField::new("vat", RelationKind::Scalar).with_key())
        .with_field(PatternField::new("name", RelationKind::Scalar))
        .with_format(ExportFormat::Csv);
    let records = vec![record(json!({"vat": "FR123", "name": "Acme"}))];

    let bytes = csv::write_records(&pattern, &records).expect("writes");
    let rows = csv::read_rows(&bytes).expect("reads back");

    let registry = SchemaRegistry::new().with_model(
        "res.partner",
        ModelSchema::new()
            .with_field("vat", FieldDef::scalar())
            .with_field("name", FieldDef::scalar()),
    );
    let search = MemorySearch::new();
    let importer =
        Importer::new(&pattern, &registry, &search, ImportConfig::default()).expect("valid");
    let mut loader = MemoryLoader::default();
    let result = importer.run(rows, &mut loader).expect("runs");

    assert!(result.is_success());
    assert_eq!(
        serde_json::to_value(&loader.records[0].1).expect("serializes"),
        json!({"name": "Acme", "vat": "FR123"})
    );
}

#[test]
fn test_lookup_tabs_list_permitted_records_only() {
    let pattern = ExportPattern::new("Partners", "res.partner").with_field(
        PatternField::new("country_id/code", RelationKind::Many2one)
            .with_comodel("res.country")
            .with_tab_filter(TabFilter {
                name: "EU".to_string(),
                domain: Predicate::eq("europe", json!(true)),
            }),
    );
    let search = MemorySearch::new()
        .with_record(
            "res.country",
            1,
            json!({"display_name": "France", "europe": true}),
        )
        .with_record(
            "res.country",
            2,
            json!({"display_name": "Japan", "europe": false}),
        );

    let exporter = pattern_service::Exporter::new(&pattern).expect("valid");
    let tabs = exporter.tab_data(&search).expect("tabs");
    assert_eq!(tabs.len(), 1);
    assert_eq!(tabs[0].name, "res.country (EU)");
    assert_eq!(tabs[0].rows, vec![vec!["France".to_string()]]);
}
