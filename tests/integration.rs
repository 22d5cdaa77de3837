//! End-to-end tests for the retrograph pipeline.
//!
//! These tests run RetroPath2.0-style CSV text through ingestion, assembly,
//! pruning, enrichment and export, checking that the stages work together.

use retrograph::compound::Descriptors;
use retrograph::config::PipelineConfig;
use retrograph::enrich::{Depicter, StaticTemplates};
use retrograph::error::{EnrichError, IngestError, RetroError};
use retrograph::export::{OutputFormat, write_network};
use retrograph::graph::NodeData;
use retrograph::ingest::{StructureDescriber, read_rows};
use retrograph::pipeline::{Pipeline, PipelineOutput};

const HEADER: &str = "Initial source,Transformation ID,Reaction SMILES,Substrate SMILES,Substrate InChI,Product SMILES,Product InChI,In Sink,Sink name,Diameter,Rule ID,EC number,Score,Iteration\n";

// Retro direction as written by RetroPath2.0:
//   TGT (target, glucose-6-phosphate) <= GLC + ATP  (T1, iteration 0)
//   TGT <= ADP + P                                  (T2, iteration 0)
//   GLC <= W + OTHER                                (T3, iteration 1)
// Sinks: GLC (MNXM41), ATP (MNXM3), W (water, MNXM2). W is a cofactor.
const BODY: &str = "\
src,T1,TGT>>GLC.ATP,TGT,InChI=TGT,GLC,InChI=GLC,1,[MNXM41],16,\"[RR-1, RR-2]\",[2.7.1.1],0.9,0\n\
src,T1,TGT>>GLC.ATP,TGT,InChI=TGT,ATP,InChI=ATP,1,[MNXM3],16,\"[RR-1, RR-2]\",[2.7.1.1],0.9,0\n\
src,T2,TGT>>ADP.P,TGT,InChI=TGT,ADP,InChI=ADP,0,[],16,[RR-3],[],0.4,0\n\
src,T2,TGT>>ADP.P,TGT,InChI=TGT,P,InChI=P,0,[],16,[RR-3],[],0.4,0\n\
src,T3,GLC>>W.OTHER,GLC,InChI=GLC,W,InChI=1S/H2O/h1H2,1,[MNXM2],12,[RR-4],[3.2.1.1],0.7,1\n\
src,T3,GLC>>W.OTHER,GLC,InChI=GLC,OTHER,InChI=OTHER,0,[],12,[RR-4],[3.2.1.1],0.7,1\n";

fn run(config: PipelineConfig) -> PipelineOutput {
    let rows = read_rows(format!("{HEADER}{BODY}").as_bytes()).unwrap();
    Pipeline::new(config).run(rows).unwrap()
}

fn ids(output: &PipelineOutput) -> Vec<String> {
    output.graph.nodes().map(|n| n.id().to_string()).collect()
}

fn uid(output: &PipelineOutput, smiles: &str) -> String {
    output.registry.lookup(smiles).unwrap().to_string()
}

#[test]
fn target_is_promoted_once() {
    let output = run(PipelineConfig::default());
    let targets: Vec<_> = output.registry.iter().filter(|c| c.is_target).collect();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].original_smiles, "TGT");
    assert_eq!(targets[0].uid, "TARGET_0000000001");
}

#[test]
fn pruning_keeps_sink_paths_and_drops_dead_ends() {
    let output = run(PipelineConfig::default());
    let kept = ids(&output);

    // GLC and ATP reach the target through T1.
    for smiles in ["GLC", "ATP"] {
        assert!(kept.contains(&uid(&output, smiles)), "{smiles} should be kept");
    }
    assert!(kept.contains(&"T1".to_string()));
    assert!(kept.contains(&"TARGET_0000000001".to_string()));

    // T2 leads to no sink; W is excluded as water, so T3 and OTHER go too.
    for smiles in ["ADP", "P", "W", "OTHER"] {
        assert!(!kept.contains(&uid(&output, smiles)), "{smiles} should be pruned");
    }
    assert!(!kept.contains(&"T2".to_string()));
    assert!(!kept.contains(&"T3".to_string()));
    assert_eq!(output.stats.prune.connected_sinks(), 2);
}

#[test]
fn without_exclusions_the_water_branch_survives() {
    let output = run(PipelineConfig {
        excluded: vec![],
        ..Default::default()
    });
    let kept = ids(&output);
    assert!(kept.contains(&uid(&output, "W")));
    assert!(kept.contains(&"T3".to_string()));
    // OTHER is a co-product, not on any shortest sink path.
    assert!(!kept.contains(&uid(&output, "OTHER")));
}

#[test]
fn unrelated_exclusion_has_no_effect() {
    let default = run(PipelineConfig::default());
    let with_extra = run(PipelineConfig {
        excluded: [
            PipelineConfig::default().excluded,
            vec!["InChI=NOT-IN-NETWORK".to_string()],
        ]
        .concat(),
        ..Default::default()
    });
    assert_eq!(ids(&default), ids(&with_extra));
}

#[test]
fn runs_are_deterministic() {
    let a = run(PipelineConfig::default()).export().to_json().unwrap();
    let b = run(PipelineConfig::default()).export().to_json().unwrap();
    assert_eq!(a, b);
}

#[test]
fn edges_point_from_precursors_to_target() {
    let output = run(PipelineConfig::default());
    let glc = uid(&output, "GLC");
    let edges: Vec<(String, String, u32)> = output
        .graph
        .edges()
        .map(|(s, t, e)| (s.to_string(), t.to_string(), e.coeff))
        .collect();
    assert!(edges.contains(&(glc.clone(), "T1".to_string(), 1)));
    assert!(edges.contains(&("T1".to_string(), "TARGET_0000000001".to_string(), 1)));

    let t1 = output.transformations.iter().find(|t| t.id == "T1").unwrap();
    assert_eq!(t1.smiles, "ATP.GLC>>TGT");
}

#[test]
fn wrong_target_yields_empty_export() {
    let output = run(PipelineConfig {
        target_id: "TARGET_0000000042".into(),
        ..Default::default()
    });
    assert!(output.graph.is_empty());
    assert!(output.export().is_empty());
}

#[test]
fn inconsistent_rows_abort_the_run() {
    let body = "src,T1,A>>B,A,,B,,0,[],16,[R],[],1,0\nsrc,T1,A>>B,Z,,B,,0,[],16,[R],[],1,0\n";
    let rows = read_rows(format!("{HEADER}{body}").as_bytes()).unwrap();
    let err = Pipeline::new(PipelineConfig::default()).run(rows).unwrap_err();
    assert!(matches!(
        err,
        RetroError::Ingest(IngestError::SubstrateMismatch { .. })
    ));
}

struct Placeholder;

impl Depicter for Placeholder {
    fn depict(&self, id: &str, descriptors: &Descriptors) -> Result<String, EnrichError> {
        match descriptors.inchi.as_deref() {
            Some(inchi) if inchi.starts_with("InChI=") => Ok(format!("data:image/svg+xml,{id}")),
            _ => Err(EnrichError::Depiction {
                id: id.to_string(),
                message: "no InChI".into(),
            }),
        }
    }
}

#[test]
fn enrichment_annotates_surviving_nodes() {
    let dir = tempfile::TempDir::new().unwrap();
    let table = dir.path().join("templates.json");
    std::fs::write(
        &table,
        r#"{"RR-1": ["MNXR94688"], "RR-2": ["MNXR94688", "MNXR1"]}"#,
    )
    .unwrap();

    let rows = read_rows(format!("{HEADER}{BODY}").as_bytes()).unwrap();
    let output = Pipeline::new(PipelineConfig::default())
        .with_depicter(Placeholder)
        .with_templates(StaticTemplates::load(&table).unwrap())
        .run(rows)
        .unwrap();

    for node in output.graph.nodes() {
        match node {
            NodeData::Chemical(c) => assert!(c.svg.is_some(), "{} lacks a depiction", c.id),
            NodeData::Reaction(r) => assert_eq!(r.rxn_template_ids, vec!["MNXR1", "MNXR94688"]),
        }
    }
    assert_eq!(output.stats.enrich.depiction_failures, 0);
}

#[test]
fn script_export_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let output = run(PipelineConfig::default());
    let json = output.export().to_json().unwrap();
    let written = write_network(&json, dir.path(), OutputFormat::Script).unwrap();

    let content = std::fs::read_to_string(written).unwrap();
    let payload = content.strip_prefix("network = ").unwrap();
    let value: serde_json::Value = serde_json::from_str(payload).unwrap();
    let nodes = value["elements"]["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), output.graph.node_count());
    let target = nodes
        .iter()
        .find(|n| n["data"]["id"] == "TARGET_0000000001")
        .unwrap();
    assert_eq!(target["data"]["target_chemical"], true);
    assert_eq!(target["data"]["type"], "chemical");
}

#[test]
fn glucose_phosphorylation_scenario() {
    use retrograph::graph::prune::prune;
    use retrograph::graph::{EDGE_SEPARATOR, RetroGraph};
    use retrograph::reaction::{RawReaction, Transformation};
    use retrograph::registry::StructureRegistry;

    let (water, glucose, atp, g6p, adp) = (
        "O",
        "OCC1OC(O)C(O)C(O)C1O",
        "ATP",
        "OC1OC(COP(O)(O)=O)C(O)C(O)C1O",
        "ADP",
    );
    let mut reg = StructureRegistry::new();
    for smiles in [water, glucose, atp, g6p, adp] {
        reg.get_or_create(smiles);
    }
    assert_eq!(reg.promote_to_target(glucose).as_deref(), Some("TARGET_0000000001"));
    assert!(reg.promote_to_target(glucose).is_none());
    for (smiles, label) in [
        (water, "MNXM2"),
        (atp, "MNXM3"),
        (g6p, "MNXM160"),
        (adp, "MNXM7"),
    ] {
        let uid = reg.lookup(smiles).unwrap().to_string();
        reg.annotate_sink(&uid, label);
    }

    let raw = RawReaction {
        id: "RXN1".into(),
        smiles: format!("{glucose}.{atp}>>{g6p}.{adp}"),
        ec_numbers: vec!["2.7.1.1".into()],
        ..Default::default()
    };
    let transformations = vec![Transformation::new(raw, &reg, false).unwrap()];

    let survivors = |excluded: &[String]| {
        let mut graph = RetroGraph::build(&reg, &transformations, EDGE_SEPARATOR).unwrap();
        prune(&mut graph, "TARGET_0000000001", excluded);
        let mut ids: Vec<String> = graph.nodes().map(|n| n.id().to_string()).collect();
        ids.sort();
        ids
    };

    let kept = survivors(&[]);
    let mut expected: Vec<String> = [glucose, atp, g6p, adp]
        .iter()
        .map(|s| reg.lookup(s).unwrap().to_string())
        .chain(["RXN1".to_string()])
        .collect();
    expected.sort();
    assert_eq!(kept, expected);
    assert_eq!(survivors(&[water.to_string()]), kept);
}

struct KeyedDescriber;

impl StructureDescriber for KeyedDescriber {
    fn describe(&self, current: &Descriptors) -> Result<Descriptors, String> {
        Ok(Descriptors {
            inchikey: Some(format!("KEY-{}", current.smiles)),
            ..current.clone()
        })
    }
}

#[test]
fn inchikeys_come_only_from_a_describer() {
    let default = run(PipelineConfig::default());
    assert!(default.graph.nodes().all(|n| match n {
        NodeData::Chemical(c) => c.inchikey.is_none(),
        NodeData::Reaction(_) => true,
    }));

    let rows = read_rows(format!("{HEADER}{BODY}").as_bytes()).unwrap();
    let described = Pipeline::new(PipelineConfig::default())
        .with_describer(KeyedDescriber)
        .run(rows)
        .unwrap();
    let json = described.export().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let target = value["elements"]["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["data"]["id"] == "TARGET_0000000001")
        .unwrap();
    assert_eq!(target["data"]["inchikey"], "KEY-TGT");
}
