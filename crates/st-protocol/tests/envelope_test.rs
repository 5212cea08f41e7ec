use st_protocol::{Envelope, ExtensionMessage, PageMessage, TestApiResponse};

#[tokio::test]
async fn test_api_reply_reaches_the_caller() {
    let (envelope, reply) = Envelope::test_api();
    assert_eq!(envelope.message, ExtensionMessage::TestApi);

    let responder = tokio::spawn(async move {
        let tx = envelope.reply.expect("TEST_API carries a reply slot");
        tx.send(TestApiResponse::ok("Connected")).unwrap();
    });

    let response = reply.await.unwrap();
    assert!(response.success);
    assert_eq!(response.message, "Connected");
    responder.await.unwrap();
}

#[tokio::test]
async fn dropped_envelope_closes_the_reply() {
    let (envelope, reply) = Envelope::test_api();
    drop(envelope);
    assert!(reply.await.is_err());
}

#[test]
fn heartbeats_expect_no_reply() {
    let envelope = Envelope::fire_and_forget(ExtensionMessage::TestApi);
    assert!(envelope.reply.is_none());
}

#[test]
fn test_api_response_wire_shape() {
    let json = serde_json::to_string(&TestApiResponse::failed("API key is required")).unwrap();
    assert_eq!(json, r#"{"success":false,"message":"API key is required"}"#);
}

#[test]
fn page_events_are_namespaced_and_distinct() {
    let all = [
        PageMessage::EditorReady,
        PageMessage::EditorChange,
        PageMessage::CursorActivity,
        PageMessage::RequestEditorData,
        PageMessage::EditorDataResponse { detail: None },
    ];
    let mut names: Vec<_> = all.iter().map(PageMessage::event_name).collect();
    assert!(names.iter().all(|n| n.starts_with("shadertime-")));
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), all.len());
}

#[test]
fn page_messages_parse_from_event_json() {
    let msg: PageMessage = serde_json::from_str(r#"{"event":"request-editor-data"}"#).unwrap();
    assert_eq!(msg, PageMessage::RequestEditorData);
}
