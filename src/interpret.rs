//! Turns one `/process_image/` round trip into the three result panels.
//!
//! The backend is loose about what it includes: error replies may still
//! carry a recognition result, and accuracy comes in two shapes. Every field
//! is read off the raw JSON and falls back to [`NOT_AVAILABLE`].

use crate::backend::{Reply, TransportError};
use crate::types::NOT_AVAILABLE;
use log::{info, warn};
use serde_json::Value;

pub const LOADING_TEXT: &str = "Memproses permintaan...";
const APPLICATION_FALLBACK: &str = "Gagal memproses.";
const SERVER_FALLBACK: &str = "Terjadi kesalahan server.";
const INFERENCE_TIME_UNIT: &str = "detik";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
    Loading,
}

impl StatusKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusKind::Success => "success",
            StatusKind::Error => "error",
            StatusKind::Loading => "loading",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBanner {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusBanner {
    pub fn success<S: Into<String>>(text: S) -> StatusBanner {
        StatusBanner {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error<S: Into<String>>(text: S) -> StatusBanner {
        StatusBanner {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }

    pub fn loading() -> StatusBanner {
        StatusBanner {
            kind: StatusKind::Loading,
            text: LOADING_TEXT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionPanel {
    pub plate: String,
    pub vehicle_type: String,
    pub inference_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccuracyPanel {
    pub true_plate: String,
    pub true_type: String,
    pub plate_accuracy: String,
    pub type_accuracy: String,
    pub overall_accuracy: String,
    pub message: String,
}

/// Everything the result area shows. A `None` panel is hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panels {
    pub status: Option<StatusBanner>,
    pub recognition: Option<RecognitionPanel>,
    pub accuracy: Option<AccuracyPanel>,
}

impl Panels {
    /// State shown from dispatch until the reply arrives.
    pub fn pending() -> Panels {
        Panels {
            status: Some(StatusBanner::loading()),
            recognition: None,
            accuracy: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    ApplicationError,
    TransportError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub outcome: Outcome,
    pub panels: Panels,
}

pub fn interpret(result: &Result<Reply, TransportError>) -> Interpretation {
    let reply = match result {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Submission failed: {}", e);
            return Interpretation {
                outcome: Outcome::TransportError,
                panels: Panels {
                    status: Some(StatusBanner::error(format!("Terjadi kesalahan: {}", e))),
                    recognition: None,
                    accuracy: None,
                },
            };
        }
    };
    let body = &reply.body;

    if !reply.status.is_success() {
        let reason = text(&body["detail"])
            .or_else(|| text(&body["message"]))
            .unwrap_or_else(|| SERVER_FALLBACK.to_string());
        warn!("Backend answered {}: {}", reply.status, reason);
        return Interpretation {
            outcome: Outcome::TransportError,
            panels: Panels {
                status: Some(StatusBanner::error(format!("Error: {}", reason))),
                recognition: recognition_panel(&body["groq_result"]),
                accuracy: None,
            },
        };
    }

    let (outcome, status) = if body["status"].as_str() == Some("success") {
        let message = text(&body["message"]).unwrap_or_default();
        info!("Submission succeeded: {}", message);
        (Outcome::Success, StatusBanner::success(message))
    } else {
        let message = text(&body["message"]).unwrap_or_else(|| APPLICATION_FALLBACK.to_string());
        info!("Submission rejected: {}", message);
        (Outcome::ApplicationError, StatusBanner::error(message))
    };

    Interpretation {
        outcome,
        panels: Panels {
            status: Some(status),
            recognition: recognition_panel(&body["groq_result"]),
            accuracy: accuracy_panel(&body["accuracy_info"]),
        },
    }
}

fn recognition_panel(data: &Value) -> Option<RecognitionPanel> {
    if data.is_null() {
        return None;
    }
    Some(RecognitionPanel {
        plate: text_or_sentinel(&data["Plat_Nomor"]),
        vehicle_type: text_or_sentinel(&data["Vehicle_Type"]),
        inference_time: match data["inference_time_seconds"].as_f64() {
            Some(seconds) => format!("{} {}", seconds, INFERENCE_TIME_UNIT),
            None => NOT_AVAILABLE.to_string(),
        },
    })
}

fn accuracy_panel(data: &Value) -> Option<AccuracyPanel> {
    if data.is_null() {
        return None;
    }
    let message = text(&data["message"]);
    if let (Some(message), None) = (&message, text(&data["true_plate"])) {
        // Ground truth missing: only the explanation is meaningful.
        return Some(AccuracyPanel {
            true_plate: NOT_AVAILABLE.to_string(),
            true_type: NOT_AVAILABLE.to_string(),
            plate_accuracy: NOT_AVAILABLE.to_string(),
            type_accuracy: NOT_AVAILABLE.to_string(),
            overall_accuracy: NOT_AVAILABLE.to_string(),
            message: message.clone(),
        });
    }
    Some(AccuracyPanel {
        true_plate: text_or_sentinel(&data["true_plate"]),
        true_type: text_or_sentinel(&data["true_type"]),
        plate_accuracy: score(&data["plate_accuracy"]),
        type_accuracy: score(&data["type_accuracy"]),
        overall_accuracy: score(&data["overall_accuracy"]),
        message: String::new(),
    })
}

/// Displayable text of a field. Missing, null and empty strings count as absent.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn text_or_sentinel(value: &Value) -> String {
    text(value).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn score(value: &Value) -> String {
    match value.as_f64() {
        Some(n) => format!("{:.2}", n),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    fn reply(status: StatusCode, body: Value) -> Result<Reply, TransportError> {
        Ok(Reply { status, body })
    }

    #[test]
    fn success_shows_message_and_panels() {
        let result = interpret(&reply(
            StatusCode::OK,
            json!({
                "status": "success",
                "message": "Kendaraan Mobil dengan plat B1234ABC berhasil masuk.",
                "groq_result": {
                    "Plat_Nomor": "B1234ABC",
                    "Vehicle_Type": "Mobil",
                    "inference_time_seconds": 1.234
                }
            }),
        ));
        assert_eq!(result.outcome, Outcome::Success);
        assert_eq!(
            result.panels.status,
            Some(StatusBanner::success(
                "Kendaraan Mobil dengan plat B1234ABC berhasil masuk."
            ))
        );
        assert_eq!(
            result.panels.recognition,
            Some(RecognitionPanel {
                plate: "B1234ABC".to_string(),
                vehicle_type: "Mobil".to_string(),
                inference_time: "1.234 detik".to_string(),
            })
        );
        assert_eq!(result.panels.accuracy, None);
    }

    #[test]
    fn recognition_fields_default_to_sentinel() {
        let result = interpret(&reply(
            StatusCode::OK,
            json!({"status": "success", "message": "ok", "groq_result": {"Plat_Nomor": ""}}),
        ));
        let panel = result.panels.recognition.unwrap();
        assert_eq!(panel.plate, NOT_AVAILABLE);
        assert_eq!(panel.vehicle_type, NOT_AVAILABLE);
        assert_eq!(panel.inference_time, NOT_AVAILABLE);
    }

    #[test]
    fn application_error_keeps_attached_data() {
        let result = interpret(&reply(
            StatusCode::OK,
            json!({
                "status": "error",
                "message": "Kendaraan dengan plat nomor B1234ABC sudah terparkir.",
                "groq_result": {"Plat_Nomor": "B1234ABC", "Vehicle_Type": "Mobil"},
                "accuracy_info": {"message": "label not found"}
            }),
        ));
        assert_eq!(result.outcome, Outcome::ApplicationError);
        assert_eq!(
            result.panels.status,
            Some(StatusBanner::error(
                "Kendaraan dengan plat nomor B1234ABC sudah terparkir."
            ))
        );
        assert!(result.panels.recognition.is_some());
        assert!(result.panels.accuracy.is_some());
    }

    #[test]
    fn application_error_without_message_uses_fallback() {
        let result = interpret(&reply(StatusCode::OK, json!({"status": "error"})));
        assert_eq!(result.outcome, Outcome::ApplicationError);
        assert_eq!(
            result.panels.status,
            Some(StatusBanner::error(APPLICATION_FALLBACK))
        );
    }

    #[test]
    fn http_error_prefers_detail() {
        let result = interpret(&reply(
            StatusCode::NOT_FOUND,
            json!({"detail": "Gambar berlabel x.jpg tidak ditemukan.", "message": "ignored"}),
        ));
        assert_eq!(result.outcome, Outcome::TransportError);
        assert_eq!(
            result.panels.status,
            Some(StatusBanner::error(
                "Error: Gambar berlabel x.jpg tidak ditemukan."
            ))
        );
    }

    #[test]
    fn http_error_falls_back_to_message_then_generic() {
        let with_message = interpret(&reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"status": "error", "message": "Gagal memparsing hasil dari Groq."}),
        ));
        assert_eq!(
            with_message.panels.status,
            Some(StatusBanner::error("Error: Gagal memparsing hasil dari Groq."))
        );

        let bare = interpret(&reply(StatusCode::BAD_GATEWAY, Value::Null));
        assert_eq!(
            bare.panels.status,
            Some(StatusBanner::error("Error: Terjadi kesalahan server."))
        );
        assert_eq!(bare.panels.recognition, None);
    }

    #[test]
    fn http_error_still_shows_recognition() {
        let result = interpret(&reply(
            StatusCode::BAD_REQUEST,
            json!({
                "status": "error",
                "message": "Plat nomor atau jenis kendaraan tidak dapat dideteksi oleh Groq.",
                "groq_result": {
                    "Plat_Nomor": "TIDAK_TERDETEKSI",
                    "Vehicle_Type": "Mobil",
                    "inference_time_seconds": 0.8
                },
                "accuracy_info": {"message": "label not found"}
            }),
        ));
        assert_eq!(result.outcome, Outcome::TransportError);
        let panel = result.panels.recognition.unwrap();
        assert_eq!(panel.plate, "TIDAK_TERDETEKSI");
        assert_eq!(panel.inference_time, "0.8 detik");
        assert_eq!(result.panels.accuracy, None);
    }

    #[test]
    fn network_failure_is_transport_error() {
        let result = interpret(&Err(TransportError::Network(
            "connection refused".to_string(),
        )));
        assert_eq!(result.outcome, Outcome::TransportError);
        let status = result.panels.status.unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.starts_with("Terjadi kesalahan: "));
        assert!(status.text.contains("connection refused"));
    }

    #[test]
    fn accuracy_message_only_mode() {
        let result = interpret(&reply(
            StatusCode::OK,
            json!({
                "status": "success",
                "message": "ok",
                "accuracy_info": {"message": "label not found"}
            }),
        ));
        assert_eq!(
            result.panels.accuracy,
            Some(AccuracyPanel {
                true_plate: NOT_AVAILABLE.to_string(),
                true_type: NOT_AVAILABLE.to_string(),
                plate_accuracy: NOT_AVAILABLE.to_string(),
                type_accuracy: NOT_AVAILABLE.to_string(),
                overall_accuracy: NOT_AVAILABLE.to_string(),
                message: "label not found".to_string(),
            })
        );
    }

    #[test]
    fn accuracy_message_mode_ignores_scores_without_truth() {
        // Shape produced when the label exists but carries no plate.
        let result = interpret(&reply(
            StatusCode::OK,
            json!({
                "status": "success",
                "accuracy_info": {
                    "plate_accuracy": 0,
                    "type_accuracy": 0,
                    "overall_accuracy": 0,
                    "message": "Ground truth tidak ditemukan."
                }
            }),
        ));
        let panel = result.panels.accuracy.unwrap();
        assert_eq!(panel.plate_accuracy, NOT_AVAILABLE);
        assert_eq!(panel.message, "Ground truth tidak ditemukan.");
    }

    #[test]
    fn accuracy_full_mode() {
        let result = interpret(&reply(
            StatusCode::OK,
            json!({
                "status": "success",
                "message": "ok",
                "accuracy_info": {
                    "groq_plate": "B1234ABC",
                    "groq_type": "Mobil",
                    "true_plate": "B1234ABC",
                    "true_type": "Mobil",
                    "plate_accuracy": 100,
                    "type_accuracy": 0.0,
                    "overall_accuracy": 33.333
                }
            }),
        ));
        assert_eq!(
            result.panels.accuracy,
            Some(AccuracyPanel {
                true_plate: "B1234ABC".to_string(),
                true_type: "Mobil".to_string(),
                plate_accuracy: "100.00".to_string(),
                type_accuracy: "0.00".to_string(),
                overall_accuracy: "33.33".to_string(),
                message: String::new(),
            })
        );
    }

    #[test]
    fn pending_panels_hide_results() {
        let pending = Panels::pending();
        assert_eq!(pending.status, Some(StatusBanner::loading()));
        assert_eq!(pending.recognition, None);
        assert_eq!(pending.accuracy, None);
    }
}
