//! Image uploads.

// self
use crate::{_prelude::*, api::PrintifyClient};

const MISSING_SOURCE: &str = "Either url or contents (base64) is required";

/// Where an uploaded image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
	/// Publicly reachable URL fetched by the upstream.
	Url(String),
	/// Base64-encoded file contents.
	Contents(String),
}
impl ImageSource {
	/// Picks the URL when present and non-empty, then the contents.
	pub fn resolve(url: Option<String>, contents: Option<String>) -> Result<Self> {
		match (url.filter(|v| !v.is_empty()), contents.filter(|v| !v.is_empty())) {
			(Some(url), _) => Ok(Self::Url(url)),
			(None, Some(contents)) => Ok(Self::Contents(contents)),
			(None, None) => Err(Error::input_invalid(MISSING_SOURCE)),
		}
	}
}

impl PrintifyClient {
	/// Uploads an image to the account's media library.
	pub async fn upload_image(&self, file_name: &str, source: ImageSource) -> Result<Value> {
		let body = match source {
			ImageSource::Url(url) => json!({ "file_name": file_name, "url": url }),
			ImageSource::Contents(contents) => json!({ "file_name": file_name, "contents": contents }),
		};

		self.post("/v1/uploads/images.json", Some(body)).await
	}
}
