use crate::request::{
    mime_type, OutboundRequest, Payload, FIELD_ACTION_TYPE, FIELD_IMAGE_FILE,
    FIELD_LABELED_IMAGE_NAME,
};
use crate::snapshot::ParkingSnapshot;
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum TransportError {
    #[fail(display = "{}", _0)]
    Network(String),
    #[fail(display = "HTTP error! status: {}", _0)]
    Status(StatusCode),
    #[fail(display = "invalid response body: {}", _0)]
    Decode(String),
}

/// A completed `/process_image/` exchange. Non-2xx replies are still
/// replies: their body may explain the failure or carry partial results.
/// An undecodable error body is kept as `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

/// The recognition backend as the terminal sees it.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn labeled_images(&self) -> Result<Vec<String>, TransportError>;
    async fn process_image(&self, request: OutboundRequest) -> Result<Reply, TransportError>;
    async fn parking_data(&self) -> Result<ParkingSnapshot, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    labeled_images_url: Url,
    process_image_url: Url,
    parking_data_url: Url,
}

impl HttpBackend {
    pub fn new(base: &Url) -> Result<HttpBackend, url::ParseError> {
        Ok(HttpBackend {
            client: reqwest::Client::new(),
            labeled_images_url: base.join("labeled_images")?,
            process_image_url: base.join("process_image/")?,
            parking_data_url: base.join("parking_data")?,
        })
    }

    async fn get_json(&self, url: &Url) -> Result<Value, TransportError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

impl Backend for HttpBackend {
    async fn labeled_images(&self) -> Result<Vec<String>, TransportError> {
        let body = self.get_json(&self.labeled_images_url).await?;
        let images = body["images"]
            .as_array()
            .ok_or_else(|| TransportError::Decode("missing images list".to_string()))?;
        Ok(images
            .iter()
            .filter_map(|path| match path.as_str() {
                Some(path) => Some(path.to_string()),
                None => {
                    warn!("Ignoring labeled image entry {}", path);
                    None
                }
            })
            .collect())
    }

    async fn process_image(&self, request: OutboundRequest) -> Result<Reply, TransportError> {
        info!("Submitting {:?}", request);
        let form = form(request)?;
        let response = self
            .client
            .post(self.process_image_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(network)?;
        let status = response.status();
        let data = response.bytes().await.map_err(network)?;
        let body = match serde_json::from_slice::<Value>(&data) {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(TransportError::Decode(e.to_string())),
            Err(e) => {
                debug!("Undecodable {} body: {}", status, e);
                Value::Null
            }
        };
        debug!("Backend replied {}: {}", status, body);
        Ok(Reply { status, body })
    }

    async fn parking_data(&self) -> Result<ParkingSnapshot, TransportError> {
        match self.get_json(&self.parking_data_url).await? {
            Value::Object(records) => {
                debug!("Fetched {} parking records", records.len());
                Ok(records)
            }
            other => Err(TransportError::Decode(format!(
                "expected an object of records, got {}",
                other
            ))),
        }
    }
}

fn form(request: OutboundRequest) -> Result<Form, TransportError> {
    let form = Form::new().text(FIELD_ACTION_TYPE, request.action.as_str());
    Ok(match request.payload {
        Payload::ImageFile(file) => {
            let part = Part::bytes(file.bytes.to_vec())
                .file_name(file.name.clone())
                .mime_str(mime_type(&file))
                .map_err(network)?;
            form.part(FIELD_IMAGE_FILE, part)
        }
        Payload::LabeledImage(path) => form.text(FIELD_LABELED_IMAGE_NAME, path),
    })
}

fn network(e: reqwest::Error) -> TransportError {
    TransportError::Network(e.to_string())
}
