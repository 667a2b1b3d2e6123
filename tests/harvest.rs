use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::json;

use harvester::report::{LEGEND_SHEET_NAME, MAX_CELL_CHARS};
use harvester::tags::NO_PDF_LABEL;
use harvester::{
    collect_groups, extract_layers, load_document, ColumnSchema, Harvester, HarvestMode,
    InputDocument, Legend, Report, Sheet,
};

mod common;
use common::{
    expected_text, read_sheet, sample_capabilities, sheet_names, test_config, write_json,
    TIMESTAMP,
};

#[test]
fn round_trip_reproduces_schema_fields() {
    let dir = tempfile::tempdir().unwrap();
    let rows = extract_layers(&sample_capabilities());
    assert_eq!(rows.len(), 2);

    let schema = ColumnSchema::base();
    let sheet = Sheet::build("capabilities", &rows, &schema);
    let mut report = Report::new();
    report.add_sheet(sheet.clone());
    report.set_legend(Legend::build(None));

    let path = dir.path().join("report.xlsx");
    report.save(&path).unwrap();

    let read = read_sheet(&path, "capabilities");
    let header: Vec<String> = schema.labels().map(String::from).collect();
    assert_eq!(read[0], header);

    let expected: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            schema
                .columns()
                .iter()
                .map(|c| expected_text(&row.cell(c.field)))
                .collect()
        })
        .collect();
    assert_eq!(read[1..].to_vec(), expected);
}

#[test]
fn pipeline_writes_one_report_per_group() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_json(&root.join("input/world.json"), &sample_capabilities());
    write_json(&root.join("input/acme/dev.json"), &sample_capabilities());
    write_json(&root.join("input/acme/prod.json"), &json!({ "layer": [] }));

    let config = test_config(root, HarvestMode::Base);
    let groups = collect_groups(&config.input_dir).unwrap();
    let documents: IndexMap<String, Vec<InputDocument>> = groups
        .iter()
        .map(|(group, paths)| {
            let docs = paths.iter().map(|p| load_document(p).unwrap()).collect();
            (group.clone(), docs)
        })
        .collect();

    let harvester = Harvester::new(config);
    let summaries = harvester.run(&documents).unwrap();
    assert_eq!(summaries.len(), 2);

    let root_report = &summaries[0];
    assert_eq!(root_report.display_name(), "(root)");
    assert_eq!(
        root_report.out_file,
        root.join(format!("output/base/{}_base_layers.xlsx", TIMESTAMP))
    );
    assert_eq!(
        sheet_names(&root_report.out_file),
        vec!["world", LEGEND_SHEET_NAME]
    );

    let acme = &summaries[1];
    assert_eq!(
        acme.out_file,
        root.join(format!("output/acme/{}_acme_layers.xlsx", TIMESTAMP))
    );
    assert_eq!(
        sheet_names(&acme.out_file),
        vec!["dev", "prod", LEGEND_SHEET_NAME]
    );
    let totals: Vec<_> = acme.documents.iter().map(|d| d.total).collect();
    assert_eq!(totals, vec![2, 0]);
    assert_eq!(acme.documents[0].global_count, 1);

    // A document without hazard layers still gets its header row.
    let prod = read_sheet(&acme.out_file, "prod");
    assert_eq!(prod.len(), 1);
    assert_eq!(prod[0][0], "Layer Name");
}

#[test]
fn pdf_mode_adds_tag_column_and_legend_entry() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), HarvestMode::Pdf);
    let harvester = Harvester::new(config);

    let mut builder = harvester.begin_group("acme");
    let summary = builder.add_document(&InputDocument::new(
        "caps.json",
        "caps",
        sample_capabilities(),
    ));
    assert_eq!(summary.tag_counts.get("local"), 1);
    assert_eq!(summary.tag_counts.get("global:risk"), 1);
    let group = builder.finish().unwrap();

    assert!(group
        .out_file
        .to_string_lossy()
        .ends_with("acme_pdf_layers.xlsx"));
    assert_eq!(group.all_tags, vec!["global:risk", "local"]);

    let sheet = read_sheet(&group.out_file, "caps");
    let pdf_col = sheet[0].iter().position(|h| h == "PDF V2").unwrap();
    assert_eq!(sheet[0][pdf_col - 1], "Is Global");
    let mut tags: Vec<_> = sheet[1..].iter().map(|r| r[pdf_col].clone()).collect();
    tags.sort();
    assert_eq!(tags, vec!["global:risk", "local"]);

    let legend = read_sheet(&group.out_file, LEGEND_SHEET_NAME);
    let names: Vec<_> = legend.iter().map(|r| r[0].as_str()).collect();
    let is_global = names.iter().position(|n| *n == "Is Global").unwrap();
    assert_eq!(names[is_global + 1], "PDF V2");
    assert_eq!(names[0], "Row Colour Key");
    assert!(names.contains(&"Column Descriptions"));
    assert!(names.contains(&"  #FFD700  "));
}

#[test]
fn base_mode_does_not_render_tags() {
    let dir = tempfile::tempdir().unwrap();
    let harvester = Harvester::new(test_config(dir.path(), HarvestMode::Base));

    let mut builder = harvester.begin_group("");
    builder.add_document(&InputDocument::new(
        "caps.json",
        "caps",
        json!({ "keyword_list": ["hazardlookup"] }),
    ));
    let (report, documents) = builder.into_report();

    let header = report.sheets()[0].header();
    assert!(!header.contains(&"PDF V2"));
    assert!(documents[0].tag_counts.is_empty());
    assert!(report
        .legend()
        .unwrap()
        .descriptions()
        .iter()
        .all(|d| d.name != "PDF V2"));
    assert!(!report.sheets()[0]
        .rows()
        .iter()
        .flatten()
        .any(|c| c.to_string() == NO_PDF_LABEL));
}

#[test]
fn no_groups_is_an_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), HarvestMode::Base);
    assert!(collect_groups(&config.input_dir).unwrap().is_empty());

    let harvester = Harvester::new(config);
    assert!(harvester.run(&IndexMap::new()).unwrap().is_empty());
    assert!(!dir.path().join("output").exists());
}

#[test]
fn long_document_names_are_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let harvester = Harvester::new(test_config(dir.path(), HarvestMode::Base));

    let mut builder = harvester.begin_group("long");
    builder.add_document(&InputDocument::new(
        "a-very-long-environment-name-for-capabilities.json",
        "a-very-long-environment-name-for-capabilities",
        sample_capabilities(),
    ));
    let group = builder.finish().unwrap();

    let names = sheet_names(&group.out_file);
    assert_eq!(names[0], "a-very-long-environment-name-fo");
    assert_eq!(names[0].chars().count(), 31);
}

#[test]
fn oversized_abstract_is_truncated_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let harvester = Harvester::new(test_config(dir.path(), HarvestMode::Base));

    let mut builder = harvester.begin_group("acme");
    builder.add_document(&InputDocument::new(
        "caps.json",
        "caps",
        json!({
            "name": "huge",
            "abstract": "x".repeat(40_000),
            "keyword_list": ["hazardlookup"]
        }),
    ));
    let group = builder.finish().unwrap();

    let sheet = read_sheet(&group.out_file, "caps");
    let col = sheet[0].iter().position(|h| h == "Abstract").unwrap();
    assert_eq!(sheet[1][col].chars().count(), MAX_CELL_CHARS);
}

#[test]
fn sheet_names_differing_only_in_case_both_save() {
    let dir = tempfile::tempdir().unwrap();
    let harvester = Harvester::new(test_config(dir.path(), HarvestMode::Base));

    let mut builder = harvester.begin_group("acme");
    for stem in ["Ärger", "ärger"] {
        builder.add_document(&InputDocument::new(
            &format!("{}.json", stem),
            stem,
            sample_capabilities(),
        ));
    }
    let group = builder.finish().unwrap();

    assert_eq!(
        sheet_names(&group.out_file),
        vec!["Ärger", "ärger1", LEGEND_SHEET_NAME]
    );
}
