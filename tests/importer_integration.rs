//! End-to-end import runs against a local bucket and a mock REDCap API.

use std::path::Path;

use redcap_error_checks::http::HttpTimeouts;
use redcap_error_checks::{
    ErrorChecksImporter, FileParameterStore, ImportError, ImportOptions, LocalObjectStore,
    RunOutcome, connect_project,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HEADER: &str = "error_no,error_code,error_type,form_name,packet,var_name,check_type,test_name,\
                      short_desc,full_desc,test_logic,comp_forms,comp_vars,in_prev_versions\n";
const PROJECT_PATH: &str = "/redcap/aws/qcchecks/";

fn write_file(root: &Path, key: &str, content: &str) {
    let path = root.join(key);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn form_csv(form: &str, packet: &str, visit: &str, count: usize) -> String {
    let mut csv = HEADER.to_string();
    for n in 1..=count {
        csv.push_str(&format!(
            "{n},{form}-{visit}-m-{n:03},Error,{form},{packet},VAR{n},Missingness,\
             VAR{n} present,short,full,logic,,,yes\n"
        ));
    }
    csv
}

struct Fixture {
    _bucket: TempDir,
    _config: TempDir,
    bucket_root: std::path::PathBuf,
    parameters_file: std::path::PathBuf,
    server: MockServer,
}

impl Fixture {
    async fn new() -> Self {
        let bucket = TempDir::new().unwrap();
        let config = TempDir::new().unwrap();
        let server = MockServer::start().await;

        let parameters_file = config.path().join("parameters.json");
        let parameters = json!({
            "default": {
                (PROJECT_PATH): {"url": format!("{}/api/", server.uri()), "token": "SECRET"}
            }
        });
        std::fs::write(&parameters_file, parameters.to_string()).unwrap();

        Mock::given(method("POST"))
            .and(body_string_contains("content=project"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"project_id": 17, "project_title": "QC Checks"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("content=exportFieldNames"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"export_field_name": "error_code"}])),
            )
            .mount(&server)
            .await;

        Self {
            bucket_root: bucket.path().to_path_buf(),
            _bucket: bucket,
            _config: config,
            parameters_file,
            server,
        }
    }

    async fn mount_import(&self, count: usize, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(body_string_contains("content=record"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": count})))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    async fn importer(&self, options: ImportOptions) -> ErrorChecksImporter {
        let parameters = FileParameterStore::new(&self.parameters_file, "default");
        let project = connect_project(&parameters, PROJECT_PATH, HttpTimeouts::default())
            .await
            .unwrap();
        ErrorChecksImporter::new(
            Box::new(LocalObjectStore::new(&self.bucket_root)),
            Box::new(project),
            options,
        )
    }
}

#[tokio::test]
async fn test_import_run_imports_all_modules() {
    let fixture = Fixture::new().await;
    let root = fixture.bucket_root.clone();
    write_file(&root, "CSV/UDS/4.0/I/form_a1_ivp_error_checks_mc.csv", &form_csv("a1", "I", "ivp", 2));
    write_file(&root, "CSV/UDS/4.0/F/form_header_fvp_error_checks_mc.csv", &form_csv("uds_header", "F", "fvp", 2));
    write_file(&root, "CSV/UDS/4.0/I/notes.txt", "not a csv");
    fixture.mount_import(2, 2).await;

    let mut importer = fixture.importer(ImportOptions::new("nacc-qc-rules")).await;
    let outcome = importer.run().await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { total_records: 4 });
    assert_eq!(importer.stats().all_error_codes().len(), 4);
    assert!(importer.stats().failed_files().is_empty());
}

#[tokio::test]
async fn test_import_run_rejects_duplicate_codes_across_files() {
    let fixture = Fixture::new().await;
    let root = fixture.bucket_root.clone();
    write_file(&root, "CSV/UDS/4.0/I/form_a1_ivp_error_checks_mc.csv", &form_csv("a1", "I", "ivp", 1));
    write_file(&root, "CSV/UDS/4.0/I/form_a1_ivp_error_checks_tc.csv", &form_csv("a1", "I", "ivp", 1));
    fixture.mount_import(1, 1).await;

    let mut importer = fixture.importer(ImportOptions::new("nacc-qc-rules")).await;
    let err = importer.run().await.unwrap_err();

    let ImportError::FailedFiles { files } = &err else {
        panic!("expected FailedFiles, got {err}");
    };
    assert_eq!(files, &vec!["CSV/UDS/4.0/I/form_a1_ivp_error_checks_tc.csv".to_string()]);
    assert!(err.to_string().starts_with("Failed to import the following:\n"));
    assert_eq!(importer.stats().total_records(), 1);
}

#[tokio::test]
async fn test_import_run_fail_fast_stops_before_later_files() {
    let fixture = Fixture::new().await;
    let root = fixture.bucket_root.clone();
    // Wrong form name in every row.
    write_file(&root, "CSV/UDS/4.0/I/form_a1_ivp_error_checks_mc.csv", &form_csv("b1", "I", "ivp", 1));
    write_file(&root, "CSV/UDS/4.0/I/form_b1_ivp_error_checks_mc.csv", &form_csv("b1", "I", "ivp", 1));
    fixture.mount_import(1, 0).await;

    let mut options = ImportOptions::new("nacc-qc-rules");
    options.fail_fast = true;
    let mut importer = fixture.importer(options).await;

    let outcome = importer.run().await.unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Aborted {
            failed_file: "CSV/UDS/4.0/I/form_a1_ivp_error_checks_mc.csv".to_string()
        }
    );
}

#[tokio::test]
async fn test_import_run_dry_run_sends_no_records() {
    let fixture = Fixture::new().await;
    write_file(
        &fixture.bucket_root,
        "CSV/UDS/4.0/I/form_a1_ivp_error_checks_mc.csv",
        &form_csv("a1", "I", "ivp", 3),
    );
    fixture.mount_import(3, 0).await;

    let mut options = ImportOptions::new("nacc-qc-rules");
    options.dry_run = true;
    let mut importer = fixture.importer(options).await;

    assert_eq!(
        importer.run().await.unwrap(),
        RunOutcome::Completed { total_records: 0 }
    );
    assert_eq!(importer.stats().all_error_codes().len(), 3);
}

#[tokio::test]
async fn test_import_run_module_filter_selects_nothing() {
    let fixture = Fixture::new().await;
    write_file(
        &fixture.bucket_root,
        "CSV/UDS/4.0/I/form_a1_ivp_error_checks_mc.csv",
        &form_csv("a1", "I", "ivp", 1),
    );
    fixture.mount_import(1, 0).await;

    let mut options = ImportOptions::new("nacc-qc-rules");
    options.modules = vec!["FTLD".to_string()];
    let mut importer = fixture.importer(options).await;

    assert_eq!(
        importer.run().await.unwrap(),
        RunOutcome::Completed { total_records: 0 }
    );
    assert!(importer.stats().all_error_codes().is_empty());
}

#[tokio::test]
async fn test_import_run_transport_failure_is_fatal() {
    let fixture = Fixture::new().await;
    let root = fixture.bucket_root.clone();
    write_file(&root, "CSV/UDS/4.0/I/form_a1_ivp_error_checks_mc.csv", &form_csv("a1", "I", "ivp", 1));
    write_file(&root, "CSV/UDS/4.0/I/form_b1_ivp_error_checks_mc.csv", &form_csv("b1", "I", "ivp", 1));
    Mock::given(method("POST"))
        .and(body_string_contains("content=record"))
        .respond_with(ResponseTemplate::new(403).set_body_string("You do not have API rights"))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let mut importer = fixture.importer(ImportOptions::new("nacc-qc-rules")).await;
    let err = importer.run().await.unwrap_err();

    assert!(matches!(err, ImportError::Transport(_)));
    assert!(err.to_string().contains("HTTP Error:403 Forbidden: You do not have API rights"));
}

#[tokio::test]
async fn test_import_run_counts_malformed_key_as_failed() {
    let fixture = Fixture::new().await;
    let root = fixture.bucket_root.clone();
    write_file(&root, "CSV/UDS/form_a1_ivp_error_checks_mc.csv", &form_csv("a1", "I", "ivp", 1));
    write_file(&root, "CSV/UDS/4.0/I/form_b1_ivp_error_checks_mc.csv", &form_csv("b1", "I", "ivp", 1));
    fixture.mount_import(1, 1).await;

    let mut importer = fixture.importer(ImportOptions::new("nacc-qc-rules")).await;
    let err = importer.run().await.unwrap_err();

    assert!(matches!(
        err,
        ImportError::FailedFiles { ref files } if files == &vec!["CSV/UDS/form_a1_ivp_error_checks_mc.csv".to_string()]
    ));
    assert_eq!(importer.stats().total_records(), 1);
}

#[tokio::test]
async fn test_connect_project_unknown_profile_is_setup_error() {
    let fixture = Fixture::new().await;
    let parameters = FileParameterStore::new(&fixture.parameters_file, "missing");

    let err = connect_project(&parameters, PROJECT_PATH, HttpTimeouts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::Setup { .. }));
    assert!(err.to_string().contains("missing"));
}
