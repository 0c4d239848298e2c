//! The path reqwest puts on the wire must be the path that was signed.

use anyhow::Result;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use s3lite::{AddressingStyle, Client, Credential, EndpointConfig, ErrorKind};
use test_case::test_case;

#[test_case("a.txt" ; "plain")]
#[test_case("dir/a b+c&d=e.txt" ; "reserved characters")]
#[test_case("文件名/~user/-_.txt" ; "unicode")]
#[test_case(".hidden/a..b/.../x." ; "dots inside segments")]
#[test_case("dir//double" ; "empty segment")]
fn test_wire_path_matches_signed_path(key: &str) -> Result<()> {
    let cfg = EndpointConfig::new("http://127.0.0.1:9000", "us-east-1", AddressingStyle::PathStyle);
    let url = cfg.object_url("bucket", Some(key), &[])?;

    let req = http::Request::delete(&url).body(Bytes::new())?;
    let signed = req.uri().path().to_string();
    let wire = reqwest::Request::try_from(req)?;

    assert_eq!(wire.url().path(), signed);
    Ok(())
}

#[test_case("keep/../victim.txt" ; "parent segment")]
#[test_case("keep/./victim.txt" ; "current segment")]
#[tokio::test]
async fn test_dot_segment_keys_are_rejected_before_sending(key: &str) -> Result<()> {
    let client = Client::new(
        EndpointConfig::new("http://127.0.0.1:9", "us-east-1", AddressingStyle::PathStyle),
        "bucket",
        Credential::new("access_key_id", "secret_access_key"),
    )?;

    let err = client.delete_object(key).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    let err = client.copy_object(key, "dst.txt").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    let err = client.upload_object(key, "x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    Ok(())
}
