//! Remote storage bucket operations for listing images.

use tracing::instrument;

use super::{ClientInner, SupabaseError, check_response};

/// Bucket holding product listing images.
pub const PRODUCT_IMAGES_BUCKET: &str = "product-images";

/// Storage API handle, borrowed from [`super::SupabaseClient`].
pub struct StorageApi<'a> {
    pub(super) inner: &'a ClientInner,
}

impl StorageApi<'_> {
    fn object_endpoint(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{bucket}/{}",
            self.inner.base_url,
            encode_path(path)
        )
    }

    /// Public URL for an object in a public bucket.
    #[must_use]
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{}",
            self.inner.base_url,
            encode_path(path)
        )
    }

    /// Upload an object, replacing any existing object at the same path.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the remote service rejects
    /// the upload (e.g., bucket policy violation).
    #[instrument(skip(self, bytes, token), fields(bucket = %bucket, path = %path, size = bytes.len()))]
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        token: &str,
    ) -> Result<(), SupabaseError> {
        let request = self
            .inner
            .http
            .post(self.object_endpoint(bucket, path))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes);

        let response = self.inner.authed(request, Some(token)).send().await?;
        check_response(response).await?;
        Ok(())
    }

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(bucket = %bucket, path = %path))]
    pub async fn remove(&self, bucket: &str, path: &str, token: &str) -> Result<(), SupabaseError> {
        let request = self.inner.http.delete(self.object_endpoint(bucket, path));
        let response = self.inner.authed(request, Some(token)).send().await?;
        check_response(response).await?;
        Ok(())
    }
}

/// Percent-encode each path segment, preserving the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path_preserves_separators() {
        assert_eq!(encode_path("owner/listing.jpg"), "owner/listing.jpg");
        assert_eq!(
            encode_path("owner/summer dress.jpg"),
            "owner/summer%20dress.jpg"
        );
    }
}
