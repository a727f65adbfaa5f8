//! Subcommand handlers over in-memory tables.

use std::sync::Arc;

use regdesk_cli::companies::{run_companies, CompaniesArgs, CompaniesCommand};
use regdesk_cli::export::{run_export, ExportArgs};
use regdesk_cli::generate::{generate_with, run_submit, GenerateTarget, SubmitArgs};
use regdesk_cli::records::{run_controls, run_laws, ControlsArgs, LawsArgs};
use regdesk_cli::{Console, FilterArgs};
use regdesk_client::{MemoryStore, RecordStore};
use regdesk_core::{
    CompanyId, CompanyStatus, NewCompany, NewControlFramework, NewLaw, NewTag, TagKind,
};
use tokio_util::sync::CancellationToken;

async fn seeded() -> (Console, CompanyId) {
    let store = MemoryStore::new();
    let company = store
        .insert_company(&NewCompany {
            name: "Acme".into(),
            website: None,
            duns_number: None,
            country: "US".into(),
            status: CompanyStatus::Active,
        })
        .await
        .unwrap();
    let finance = store
        .insert_tag(
            TagKind::Domain,
            &NewTag {
                name: "Finance".into(),
                id_company: company.id,
            },
        )
        .await
        .unwrap();
    for (name, domain) in [("Dodd-Frank", Some(finance.id)), ("Unscoped", None)] {
        store
            .insert_law(&NewLaw {
                name: name.into(),
                description: String::new(),
                source: String::new(),
                country: "US".into(),
                id_company: company.id,
                id_domain: domain,
                id_activity: None,
                id_market: None,
            })
            .await
            .unwrap();
    }
    store
        .insert_control_framework(&NewControlFramework {
            context: "Access reviews".into(),
            description: String::new(),
            risk_management: String::new(),
            country_applied: "US".into(),
            referral_source: String::new(),
            id_domain: None,
            id_activity: None,
            id_market: None,
            id_laws_and_regulations: None,
            id_company: company.id,
            verified: false,
        })
        .await
        .unwrap();
    (Console::new(Arc::new(store), None), company.id)
}

#[tokio::test]
async fn laws_filter_by_domain_name() {
    let (console, company) = seeded().await;
    let args = LawsArgs {
        company,
        filter: FilterArgs {
            domain: Some("Finance".into()),
            page: 1,
            ..FilterArgs::default()
        },
    };
    let page = run_laws(&args, &console).await.unwrap();
    assert_eq!(page["total_items"], 1);
    assert_eq!(page["items"][0]["name"], "Dodd-Frank");
}

#[tokio::test]
async fn submit_then_controls_show_verified() {
    let (console, company) = seeded().await;
    let submitted = run_submit(&SubmitArgs { company }, &console).await.unwrap();
    assert_eq!(submitted["verified"], 1);

    let args = ControlsArgs {
        company,
        filter: FilterArgs {
            page: 1,
            ..FilterArgs::default()
        },
        law: None,
        verification: Some("verified".into()),
    };
    let page = run_controls(&args, &console).await.unwrap();
    assert_eq!(page["total_items"], 1);
}

#[tokio::test]
async fn companies_show_includes_tags() {
    let (console, company) = seeded().await;
    let args = CompaniesArgs {
        command: CompaniesCommand::Show { id: company },
    };
    let detail = run_companies(&args, &console).await.unwrap();
    assert_eq!(detail["company"]["name"], "Acme");
    assert_eq!(detail["domains"][0]["name"], "Finance");
    assert_eq!(detail["laws"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn generate_without_webhooks_fails() {
    let (console, company) = seeded().await;
    let err = generate_with(
        GenerateTarget::Laws { company },
        &console,
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("not configured"));
}

#[tokio::test]
async fn export_writes_workbook() {
    let (console, company) = seeded().await;
    let entry = console
        .store
        .list_control_frameworks(Some(company))
        .await
        .unwrap()
        .remove(0);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("entry.xlsx");

    let written = run_export(
        &ExportArgs {
            entry: entry.id,
            out: Some(out.clone()),
        },
        &console,
    )
    .await
    .unwrap();
    assert_eq!(written["path"], out.display().to_string());
    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}
