use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

use crate::adapters::block_on_sdk;
use crate::adapters::object_store::{ObjectStore, StoreError};

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

fn request_error(
    operation: &'static str,
    bucket: &str,
    key: &str,
    message: impl std::fmt::Display,
) -> StoreError {
    StoreError::Request {
        operation,
        bucket: bucket.to_string(),
        key: key.to_string(),
        message: message.to_string(),
    }
}

impl ObjectStore for S3ObjectStore {
    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError> {
        let client = self.client.clone();
        let body_bytes = body.to_vec();

        block_on_sdk(async move {
            client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(body_bytes))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| request_error("write", bucket, key, DisplayErrorContext(&error)))
        })
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let client = self.client.clone();

        block_on_sdk(async move {
            let output = match client.get_object().bucket(bucket).key(key).send().await {
                Ok(output) => output,
                Err(error) => {
                    let missing = error
                        .as_service_error()
                        .map(|service_error| service_error.is_no_such_key())
                        .unwrap_or(false);
                    if missing {
                        return Err(StoreError::NotFound {
                            bucket: bucket.to_string(),
                            key: key.to_string(),
                        });
                    }
                    return Err(request_error(
                        "read",
                        bucket,
                        key,
                        DisplayErrorContext(&error),
                    ));
                }
            };

            output
                .body
                .collect()
                .await
                .map(|data| data.into_bytes().to_vec())
                .map_err(|error| request_error("read body of", bucket, key, error))
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let client = self.client.clone();

        block_on_sdk(async move {
            client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| request_error("delete", bucket, key, DisplayErrorContext(&error)))
        })
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let client = self.client.clone();

        block_on_sdk(async move {
            let mut keys = Vec::new();
            let mut continuation_token: Option<String> = None;
            loop {
                let output = client
                    .list_objects_v2()
                    .bucket(bucket)
                    .prefix(prefix)
                    .set_continuation_token(continuation_token.take())
                    .send()
                    .await
                    .map_err(|error| {
                        request_error("list", bucket, prefix, DisplayErrorContext(&error))
                    })?;

                keys.extend(
                    output
                        .contents()
                        .iter()
                        .filter_map(|object| object.key().map(str::to_string)),
                );

                match output.next_continuation_token() {
                    Some(token) if output.is_truncated().unwrap_or(false) => {
                        continuation_token = Some(token.to_string());
                    }
                    _ => break,
                }
            }

            keys.sort();
            Ok(keys)
        })
    }
}
