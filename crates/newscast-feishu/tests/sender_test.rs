use mockito::Matcher;
use newscast_core::FeishuSettings;
use newscast_feishu::{FeishuError, FeishuSender};
use tempfile::TempDir;

#[tokio::test]
async fn webhook_mode_sends_text_with_headline() {
    let mut server = mockito::Server::new_async().await;

    let hook = server
        .mock("POST", "/hook")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("AI财经热点新闻汇总播报".to_string()),
            Matcher::Regex("今日要闻如下".to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"code": 0}"#)
        .create_async()
        .await;

    let settings = FeishuSettings {
        webhook_url: Some(format!("{}/hook", server.url())),
        ..Default::default()
    };
    let sender = FeishuSender::new(settings).unwrap();

    sender.send_script("今日要闻如下。", None).await.unwrap();
    hook.assert_async().await;
}

#[tokio::test]
async fn webhook_mode_appends_audio_link_when_base_url_set() {
    let mut server = mockito::Server::new_async().await;

    let hook = server
        .mock("POST", "/hook")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("点击收听".to_string()),
            Matcher::Regex("https://pages.example.com/".to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"code": 0}"#)
        .create_async()
        .await;

    let settings = FeishuSettings {
        webhook_url: Some(format!("{}/hook", server.url())),
        base_url: Some("https://pages.example.com".to_string()),
        ..Default::default()
    };
    let sender = FeishuSender::new(settings).unwrap();

    sender
        .send_script("今日要闻如下。", Some(std::path::Path::new("output/口播稿.mp3")))
        .await
        .unwrap();
    hook.assert_async().await;
}

#[tokio::test]
async fn webhook_failure_surfaces_status() {
    let mut server = mockito::Server::new_async().await;
    let _hook = server
        .mock("POST", "/hook")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let settings = FeishuSettings {
        webhook_url: Some(format!("{}/hook", server.url())),
        ..Default::default()
    };
    let sender = FeishuSender::new(settings).unwrap();

    let err = sender.send_script("text", None).await.unwrap_err();
    assert!(matches!(err, FeishuError::Api { status: 502, .. }));
}

#[tokio::test]
async fn api_mode_sends_text_then_uploads_and_sends_file() {
    let mut server = mockito::Server::new_async().await;

    let token = server
        .mock("POST", "/open-apis/auth/v3/tenant_access_token/internal")
        .with_status(200)
        .with_body(r#"{"code": 0, "tenant_access_token": "t-abc"}"#)
        .create_async()
        .await;
    let messages = server
        .mock("POST", "/open-apis/im/v1/messages")
        .match_query(Matcher::UrlEncoded(
            "receive_id_type".to_string(),
            "chat_id".to_string(),
        ))
        .match_header("authorization", "Bearer t-abc")
        .with_status(200)
        .with_body(r#"{"code": 0}"#)
        .expect(2)
        .create_async()
        .await;
    let upload = server
        .mock("POST", "/open-apis/drive/v1/files/upload_all")
        .match_header("authorization", "Bearer t-abc")
        .with_status(200)
        .with_body(r#"{"code": 0, "data": {"file_token": "file-xyz"}}"#)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let audio = dir.path().join("bulletin.mp3");
    std::fs::write(&audio, b"AUDIO").unwrap();

    let settings = FeishuSettings {
        app_id: Some("cli_x".to_string()),
        app_secret: Some("secret".to_string()),
        chat_id: Some("oc_y".to_string()),
        ..Default::default()
    };
    let sender = FeishuSender::new(settings)
        .unwrap()
        .with_api_base(server.url());

    sender.send_script("今日要闻如下。", Some(&audio)).await.unwrap();

    token.assert_async().await;
    messages.assert_async().await;
    upload.assert_async().await;
}

#[tokio::test]
async fn api_mode_is_preferred_over_webhook() {
    let mut server = mockito::Server::new_async().await;

    let hook = server.mock("POST", "/hook").expect(0).create_async().await;
    let _token = server
        .mock("POST", "/open-apis/auth/v3/tenant_access_token/internal")
        .with_status(200)
        .with_body(r#"{"code": 0, "tenant_access_token": "t-abc"}"#)
        .create_async()
        .await;
    let _messages = server
        .mock("POST", "/open-apis/im/v1/messages")
        .match_query(Matcher::UrlEncoded(
            "receive_id_type".to_string(),
            "chat_id".to_string(),
        ))
        .with_status(200)
        .with_body(r#"{"code": 0}"#)
        .create_async()
        .await;

    let settings = FeishuSettings {
        webhook_url: Some(format!("{}/hook", server.url())),
        app_id: Some("cli_x".to_string()),
        app_secret: Some("secret".to_string()),
        chat_id: Some("oc_y".to_string()),
        ..Default::default()
    };
    let sender = FeishuSender::new(settings)
        .unwrap()
        .with_api_base(server.url());

    sender.send_script("text", None).await.unwrap();
    hook.assert_async().await;
}

#[tokio::test]
async fn rejected_token_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _token = server
        .mock("POST", "/open-apis/auth/v3/tenant_access_token/internal")
        .with_status(200)
        .with_body(r#"{"code": 10003, "msg": "invalid app_secret"}"#)
        .create_async()
        .await;

    let settings = FeishuSettings {
        app_id: Some("cli_x".to_string()),
        app_secret: Some("wrong".to_string()),
        chat_id: Some("oc_y".to_string()),
        ..Default::default()
    };
    let sender = FeishuSender::new(settings)
        .unwrap()
        .with_api_base(server.url());

    let err = sender.send_script("text", None).await.unwrap_err();
    match err {
        FeishuError::Rejected(msg) => assert_eq!(msg, "invalid app_secret"),
        other => panic!("expected Rejected, got {other:?}"),
    }
}
