//! Bankruptcy verifier integration tests

use std::collections::HashSet;

use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use b3_screener::bankruptcy::BankruptcyVerifier;
use b3_screener::models::Config;
use b3_screener::ScreenerError;

use crate::common::fixtures::{detail_page, detail_page_without_status};

fn verifier_for(server: &MockServer, config: &Config) -> BankruptcyVerifier {
    BankruptcyVerifier::new(config)
        .unwrap()
        .with_detail_url(format!("{}/detail?cod_negociacao=", server.uri()))
}

async fn mount_detail(server: &MockServer, ticker: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/detail"))
        .and(query_param("cod_negociacao", ticker))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn tickers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_flags_non_operational_tickers() {
    let server = MockServer::start().await;
    mount_detail(&server, "PETR4", detail_page("FASE OPERACIONAL")).await;
    mount_detail(&server, "OIBR3", detail_page("RECUPERAÇÃO JUDICIAL")).await;
    mount_detail(&server, "VALE3", detail_page("FASE OPERACIONAL")).await;

    let verifier = verifier_for(&server, &Config::default());
    let flagged = verifier
        .verify(&tickers(&["PETR4", "OIBR3", "VALE3"]))
        .await
        .unwrap();

    let expected: HashSet<String> = ["OIBR3".to_string()].into_iter().collect();
    assert_eq!(flagged, expected);
}

#[tokio::test]
async fn test_operational_tickers_not_flagged() {
    let server = MockServer::start().await;
    for ticker in ["PETR4", "VALE3", "WEGE3", "ALSO4", "TTEN3"] {
        mount_detail(&server, ticker, detail_page("FASE OPERACIONAL")).await;
    }

    let verifier = verifier_for(&server, &Config::default());
    let flagged = verifier
        .verify(&tickers(&["PETR4", "VALE3", "WEGE3", "ALSO4", "TTEN3"]))
        .await
        .unwrap();

    assert!(flagged.is_empty());
}

#[tokio::test]
async fn test_missing_status_element_is_fatal_in_strict_mode() {
    let server = MockServer::start().await;
    mount_detail(&server, "PETR4", detail_page_without_status()).await;

    let verifier = verifier_for(&server, &Config::default());
    let err = verifier.verify(&tickers(&["PETR4"])).await.unwrap_err();

    match err.downcast_ref::<ScreenerError>() {
        Some(ScreenerError::StatusElementNotFound(ticker)) => assert_eq!(ticker, "PETR4"),
        other => panic!("expected StatusElementNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_status_element_is_skipped_in_lenient_mode() {
    let server = MockServer::start().await;
    mount_detail(&server, "PETR4", detail_page_without_status()).await;
    mount_detail(&server, "OIBR3", detail_page("EM LIQUIDAÇÃO")).await;

    let config = Config {
        strict_bankruptcy: false,
        ..Config::default()
    };
    let verifier = verifier_for(&server, &config);
    let flagged = verifier
        .verify(&tickers(&["PETR4", "OIBR3"]))
        .await
        .unwrap();

    // The unreadable page is skipped, not inferred either way
    let expected: HashSet<String> = ["OIBR3".to_string()].into_iter().collect();
    assert_eq!(flagged, expected);
}

#[tokio::test]
async fn test_fetch_failure_is_fatal_in_strict_mode() {
    let server = MockServer::start().await;
    mount_detail(&server, "PETR4", detail_page("FASE OPERACIONAL")).await;
    // No mock for BADT5: the server answers 404

    let verifier = verifier_for(&server, &Config::default());
    let result = verifier.verify(&tickers(&["PETR4", "BADT5"])).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_fetch_failure_is_skipped_in_lenient_mode() {
    let server = MockServer::start().await;
    mount_detail(&server, "PETR4", detail_page("FASE OPERACIONAL")).await;

    let config = Config {
        strict_bankruptcy: false,
        ..Config::default()
    };
    let verifier = verifier_for(&server, &config);
    let flagged = verifier
        .verify(&tickers(&["PETR4", "BADT5"]))
        .await
        .unwrap();

    assert!(flagged.is_empty());
}

#[tokio::test]
async fn test_empty_candidate_list_fails_before_any_fetch() {
    let server = MockServer::start().await;

    let verifier = verifier_for(&server, &Config::default());
    let err = verifier.verify(&[]).await.unwrap_err();

    match err.downcast_ref::<ScreenerError>() {
        Some(ScreenerError::EmptyDataset(_)) => {}
        other => panic!("expected EmptyDataset, got {:?}", other),
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_partition_fails_before_any_fetch() {
    let server = MockServer::start().await;

    let config = Config {
        worker_count: 0,
        ..Config::default()
    };
    let verifier = verifier_for(&server, &config);
    let err = verifier.verify(&tickers(&["PETR4"])).await.unwrap_err();

    match err.downcast_ref::<ScreenerError>() {
        Some(ScreenerError::InvalidPartition(_)) => {}
        other => panic!("expected InvalidPartition, got {:?}", other),
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_more_workers_than_candidates_still_covers_all() {
    let server = MockServer::start().await;
    mount_detail(&server, "PETR4", detail_page("FASE OPERACIONAL")).await;
    mount_detail(&server, "OIBR3", detail_page("FALIDA")).await;

    let config = Config {
        worker_count: 8,
        ..Config::default()
    };
    let verifier = verifier_for(&server, &config);
    let flagged = verifier
        .verify(&tickers(&["PETR4", "OIBR3"]))
        .await
        .unwrap();

    let expected: HashSet<String> = ["OIBR3".to_string()].into_iter().collect();
    assert_eq!(flagged, expected);
}
