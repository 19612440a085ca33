use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rssync_client::SoapCatalogClient;
use rssync_core::{CatalogClient, ClientError, ItemKind};

struct Captured {
    head: String,
    body: String,
}

/// Serve one canned response per connection, then stop.
fn serve(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<Captured>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}/ReportServer", listener.local_addr().expect("addr"));
    let handle = thread::spawn(move || {
        let mut captured = Vec::new();
        for (status, body) in responses {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("read header");
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().expect("length");
                    }
                }
                head.push_str(&line);
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).expect("read body");
            captured.push(Captured {
                head,
                body: String::from_utf8(request_body).expect("utf8"),
            });

            let reason = if status == 200 { "OK" } else { "Internal Server Error" };
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status} {reason}\r\nContent-Type: text/xml; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .expect("write response");
            stream.flush().expect("flush");
        }
        captured
    });
    (url, handle)
}

fn envelope(inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>{inner}</soap:Body></soap:Envelope>"#
    )
}

fn fault(code: &str, message: &str) -> String {
    envelope(&format!(
        r#"<soap:Fault><faultcode>soap:Client</faultcode><faultstring>{message}</faultstring><detail><ErrorCode xmlns="http://www.microsoft.com/sql/reportingservices">{code}</ErrorCode></detail></soap:Fault>"#
    ))
}

fn client(url: &str) -> SoapCatalogClient {
    SoapCatalogClient::new(url, Duration::from_secs(5)).with_basic_auth("svc", "pw")
}

#[test]
fn create_folder_posts_soap_request() {
    let (url, server) = serve(vec![(200, envelope("<CreateFolderResponse/>"))]);
    let mut client = client(&url);
    client.create_folder("Finance", "/").expect("create folder");

    let captured = server.join().expect("server");
    let request = &captured[0];
    assert!(request.head.starts_with("POST /ReportServer/ReportService2010.asmx"));
    let head = request.head.to_ascii_lowercase();
    assert!(head.contains(
        "soapaction: \"http://schemas.microsoft.com/sqlserver/reporting/2010/03/01/reportserver/createfolder\""
    ));
    assert!(head.contains("authorization: basic c3zjonb3"));
    assert!(request.body.contains("<Folder>Finance</Folder><Parent>/</Parent>"));
}

#[test]
fn already_exists_fault_is_distinguished() {
    let (url, server) = serve(vec![(
        500,
        fault("rsItemAlreadyExists", "The item '/Finance' already exists."),
    )]);
    let mut client = client(&url);
    let err = client.create_folder("Finance", "/").unwrap_err();
    server.join().expect("server");

    match err {
        ClientError::AlreadyExists { path } => assert_eq!(path, "/Finance"),
        other => panic!("expected AlreadyExists, got {other:?}"),
    }
}

#[test]
fn other_faults_carry_code_and_message() {
    let (url, server) = serve(vec![(500, fault("rsAccessDenied", "Permissions denied."))]);
    let mut client = client(&url);
    let err = client
        .create_catalog_item(ItemKind::Report, "Sales", "/Finance", true, b"<Report/>")
        .unwrap_err();
    server.join().expect("server");

    match err {
        ClientError::Fault { code, message } => {
            assert_eq!(code, "rsAccessDenied");
            assert_eq!(message, "Permissions denied.");
        }
        other => panic!("expected Fault, got {other:?}"),
    }
}

#[test]
fn created_item_path_comes_from_reply() {
    let reply = envelope(
        r#"<CreateCatalogItemResponse xmlns="http://schemas.microsoft.com/sqlserver/reporting/2010/03/01/ReportServer"><ItemInfo><Name>Sales</Name><Path>/Finance/Sales</Path></ItemInfo></CreateCatalogItemResponse>"#,
    );
    let (url, server) = serve(vec![(200, reply)]);
    let mut client = client(&url);
    let path = client
        .create_catalog_item(ItemKind::Report, "Sales", "/Finance", true, b"<Report/>")
        .expect("create item");
    let captured = server.join().expect("server");

    assert_eq!(path, "/Finance/Sales");
    assert!(captured[0].body.contains("<ItemType>Report</ItemType>"));
    assert!(captured[0].body.contains("<Definition>PFJlcG9ydC8+</Definition>"));
}

#[test]
fn unreachable_endpoint_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let mut client = SoapCatalogClient::new(&format!("http://{addr}/ReportServer"), Duration::from_secs(2));
    let err = client.create_folder("Finance", "/").unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "got: {err:?}");
}
