use anyhow::Result;
use s3lite::{AddressingStyle, Client, Credential, EndpointConfig};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    // A local MinIO by default, override with S3LITE_* variables.
    let endpoint = env::var("S3LITE_ENDPOINT").unwrap_or_else(|_| "http://127.0.0.1:9000".into());
    let region = env::var("S3LITE_REGION").unwrap_or_else(|_| "us-east-1".into());
    let bucket = env::var("S3LITE_BUCKET").unwrap_or_else(|_| "testing".into());
    let cred = Credential::new(
        env::var("S3LITE_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".into()),
        env::var("S3LITE_SECRET_KEY").unwrap_or_else(|_| "minioadmin".into()),
    );

    let client = Client::new(
        EndpointConfig::new(&endpoint, &region, AddressingStyle::PathStyle),
        &bucket,
        cred,
    )?;

    if !client.check_bucket_access().await {
        eprintln!("bucket {bucket} at {endpoint} is not accessible");
        return Ok(());
    }

    client.upload_object("example/hello.txt", "Hello, World!").await?;
    println!(
        "downloaded: {:?}",
        client.download_object_as_text("example/hello.txt").await?
    );

    client
        .move_object("example/hello.txt", "example/moved.txt")
        .await?;
    println!("listed: {:?}", client.list_all_objects("example/").await?);

    client.delete_object("example/moved.txt").await?;
    println!(
        "exists after delete: {}",
        client.object_exists("example/moved.txt").await?
    );

    Ok(())
}
