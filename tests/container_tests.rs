//! Container operation tests.

mod common;

use common::{create_container, put_blob, TestServer};
use serde_json::Value;

#[tokio::test]
async fn test_create_container() {
    let server = TestServer::start().await;

    let response = reqwest::Client::new()
        .put(server.container_url("testcontainer"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    assert_eq!(
        response.text().await.unwrap(),
        "Container testcontainer created successfully"
    );
    assert!(server
        .data_dir
        .join("blob")
        .join(common::ACCOUNT)
        .join("testcontainer")
        .is_dir());
}

#[tokio::test]
async fn test_create_duplicate_container() {
    let server = TestServer::start().await;
    create_container(&server, "dupcontainer").await;

    let response = reqwest::Client::new()
        .put(server.container_url("dupcontainer"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 409);
    assert_eq!(
        response
            .headers()
            .get("x-ms-error-code")
            .map(|v| v.to_str().unwrap()),
        Some("ContainerAlreadyExists")
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "ContainerAlreadyExists");
}

#[tokio::test]
async fn test_container_exists() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let response = client
        .head(server.container_url("probe"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    create_container(&server, "probe").await;

    let response = client
        .head(server.container_url("probe"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_delete_container() {
    let server = TestServer::start().await;
    create_container(&server, "deletecontainer").await;
    put_blob(&server, "deletecontainer", "nested/file.txt", "data").await;

    let client = reqwest::Client::new();
    let response = client
        .delete(server.container_url("deletecontainer"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .head(server.container_url("deletecontainer"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .get(server.blob_url("deletecontainer", "nested/file.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_delete_missing_container() {
    let server = TestServer::start().await;

    let response = reqwest::Client::new()
        .delete(server.container_url("nothere"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "ContainerNotFound");
}

#[tokio::test]
async fn test_list_blobs() {
    let server = TestServer::start().await;
    create_container(&server, "listcontainer").await;
    put_blob(&server, "listcontainer", "f.txt", "hello").await;
    put_blob(&server, "listcontainer", "prefix/sub/name.txt", "nested").await;

    let response = reqwest::Client::new()
        .get(server.container_url("listcontainer"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let names: Vec<&str> = body["Blobs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["Name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["f.txt", "prefix/sub/name.txt"]);
    assert_eq!(body["Blobs"][0]["ContentLength"], 5);
    assert!(body.get("Prefix").is_none());
    assert!(body.get("MaxResults").is_none());
}

#[tokio::test]
async fn test_list_blobs_with_prefix_and_max_results() {
    let server = TestServer::start().await;
    create_container(&server, "filtered").await;
    for name in ["a/x", "a/y", "b/z"] {
        put_blob(&server, "filtered", name, "v").await;
    }
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("{}?prefix=a/", server.container_url("filtered")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["Blobs"].as_array().unwrap().len(), 2);
    assert_eq!(body["Prefix"], "a/");

    let body: Value = client
        .get(format!("{}?maxresults=1", server.container_url("filtered")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["Blobs"].as_array().unwrap().len(), 1);
    assert_eq!(body["MaxResults"], 1);

    // Non-positive and non-numeric caps are ignored.
    for cap in ["0", "-1", "many"] {
        let body: Value = client
            .get(format!("{}?maxresults={}", server.container_url("filtered"), cap))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["Blobs"].as_array().unwrap().len(), 3, "maxresults={}", cap);
        assert!(body.get("MaxResults").is_none());
    }
}

#[tokio::test]
async fn test_list_missing_container() {
    let server = TestServer::start().await;

    let response = reqwest::Client::new()
        .get(server.container_url("ghost"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "ContainerNotFound");
}

#[tokio::test]
async fn test_concurrent_create_single_winner() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let requests = (0..8).map(|_| client.put(server.container_url("race")).send());
    let statuses: Vec<u16> = futures::future::join_all(requests)
        .await
        .into_iter()
        .map(|r| r.unwrap().status().as_u16())
        .collect();

    assert_eq!(statuses.iter().filter(|&&s| s == 201).count(), 1);
    assert_eq!(statuses.iter().filter(|&&s| s == 409).count(), 7);
}
