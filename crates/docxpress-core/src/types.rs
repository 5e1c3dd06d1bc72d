// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the docxpress service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DocxpressError, Result};

/// MIME type of a WordprocessingML package.
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const DEFAULT_WATERMARK_WIDTH: f64 = 200.0;
pub const DEFAULT_WATERMARK_HEIGHT: f64 = 100.0;
pub const DEFAULT_WATERMARK_ROTATION: f64 = -45.0;
pub const DEFAULT_WATERMARK_OPACITY: f64 = 0.2;

/// MIME type of a PDF file.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Accepted range for watermark width and height on `/generate-document`, in points.
const WATERMARK_SIZE_RANGE: (f64, f64) = (50.0, 1000.0);
/// Accepted range for watermark rotation on `/generate-document`, in degrees.
const WATERMARK_ROTATION_RANGE: (f64, f64) = (-180.0, 180.0);
/// Bounds every watermark box is clamped into before rendering, in points.
const WATERMARK_SIZE_LIMITS: (f64, f64) = (1.0, 1584.0);

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// `w:orient` attribute value in `w:pgSz`.
    pub fn ooxml_value(&self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

/// Page geometry in twips (1/20 pt), always described in portrait terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSetup {
    pub width_twips: u32,
    pub height_twips: u32,
    pub margin_top: u32,
    pub margin_right: u32,
    pub margin_bottom: u32,
    pub margin_left: u32,
    /// Distance from the page top to the header.
    pub header_distance: u32,
    /// Distance from the page bottom to the footer.
    pub footer_distance: u32,
}

impl Default for PageSetup {
    /// US Letter with 1" top/bottom and 1.25" side margins.
    fn default() -> Self {
        Self {
            width_twips: 12240,
            height_twips: 15840,
            margin_top: 1440,
            margin_right: 1800,
            margin_bottom: 1440,
            margin_left: 1800,
            header_distance: 720,
            footer_distance: 720,
        }
    }
}

impl PageSetup {
    /// Page (width, height) for the given orientation; landscape swaps them.
    pub fn dimensions(&self, orientation: Orientation) -> (u32, u32) {
        match orientation {
            Orientation::Portrait => (self.width_twips, self.height_twips),
            Orientation::Landscape => (self.height_twips, self.width_twips),
        }
    }

    /// Width available between the side margins.
    pub fn content_width(&self, orientation: Orientation) -> u32 {
        let (width, _) = self.dimensions(orientation);
        width.saturating_sub(self.margin_left + self.margin_right)
    }
}

/// Defaults applied to every generated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentDefaults {
    pub page: PageSetup,
    /// Font family of the `Normal` style.
    pub font_family: String,
    /// Font size of the `Normal` style, in points.
    pub font_size_pt: f32,
}

impl Default for DocumentDefaults {
    fn default() -> Self {
        Self {
            page: PageSetup::default(),
            font_family: "Times New Roman".into(),
            font_size_pt: 11.0,
        }
    }
}

/// Status of the HTTP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    Stopped,
    Starting,
    Running,
    Error,
}

/// JSON body of `POST /generate-docx`.
///
/// Every field is optional on the wire (`null` counts as absent); the
/// accessors apply the documented defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentRequest {
    pub content_html: Option<String>,
    pub header_html: Option<String>,
    pub footer_html: Option<String>,
    pub watermark_html: Option<String>,
    pub watermark_width: Option<f64>,
    pub watermark_height: Option<f64>,
    pub watermark_rotation: Option<f64>,
    pub watermark_opacity: Option<f64>,
    pub footer_last_page_only: Option<bool>,
}

impl DocumentRequest {
    /// Request carrying only body HTML.
    pub fn with_content(content_html: impl Into<String>) -> Self {
        Self {
            content_html: Some(content_html.into()),
            ..Self::default()
        }
    }

    pub fn header_html(&self) -> &str {
        self.header_html.as_deref().unwrap_or_default()
    }

    pub fn footer_html(&self) -> &str {
        self.footer_html.as_deref().unwrap_or_default()
    }

    pub fn watermark_html(&self) -> &str {
        self.watermark_html.as_deref().unwrap_or_default()
    }

    pub fn watermark_width(&self) -> f64 {
        self.watermark_width.unwrap_or(DEFAULT_WATERMARK_WIDTH)
    }

    pub fn watermark_height(&self) -> f64 {
        self.watermark_height.unwrap_or(DEFAULT_WATERMARK_HEIGHT)
    }

    pub fn watermark_rotation(&self) -> f64 {
        self.watermark_rotation.unwrap_or(DEFAULT_WATERMARK_ROTATION)
    }

    pub fn watermark_opacity(&self) -> f64 {
        self.watermark_opacity.unwrap_or(DEFAULT_WATERMARK_OPACITY)
    }

    pub fn footer_last_page_only(&self) -> bool {
        self.footer_last_page_only.unwrap_or(false)
    }

    /// Check the request and return the body HTML.
    ///
    /// `content_html` must be present and non-empty. Nothing else is ever
    /// rejected; out-of-range watermark geometry is clamped when the options
    /// are built.
    pub fn validate(&self) -> Result<&str> {
        match self.content_html.as_deref() {
            Some(content) if !content.is_empty() => Ok(content),
            _ => Err(DocxpressError::MissingField("content_html")),
        }
    }

    /// Range-check the watermark geometry. Skipped when no watermark is
    /// requested.
    pub fn validate_watermark(&self) -> Result<()> {
        if self.watermark_html().is_empty() {
            return Ok(());
        }
        check_range("watermark_width", self.watermark_width(), WATERMARK_SIZE_RANGE)?;
        check_range("watermark_height", self.watermark_height(), WATERMARK_SIZE_RANGE)?;
        check_range(
            "watermark_rotation",
            self.watermark_rotation(),
            WATERMARK_ROTATION_RANGE,
        )?;
        check_range("watermark_opacity", self.watermark_opacity(), (0.0, 1.0))
    }
}

fn check_range(field: &str, value: f64, (min, max): (f64, f64)) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(DocxpressError::InvalidRequest(format!(
            "{field} must be between {min} and {max}"
        )))
    }
}

/// Clamp a finite value into `min..=max`; non-finite values take `fallback`.
fn clamp_or(value: f64, (min, max): (f64, f64), fallback: f64) -> f64 {
    if value.is_finite() { value.clamp(min, max) } else { fallback }
}

/// Output format of `POST /generate-document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Docx,
}

impl DocumentType {
    /// Parse a `document_type` value, ignoring case and surrounding space.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            _ => Err(DocxpressError::InvalidRequest(
                "Invalid document type. Supported types: pdf, docx".into(),
            )),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => PDF_MIME_TYPE,
            Self::Docx => DOCX_MIME_TYPE,
        }
    }

    /// Attachment filename for the response.
    pub fn filename(&self) -> &'static str {
        match self {
            Self::Pdf => "document.pdf",
            Self::Docx => "document.docx",
        }
    }
}

/// JSON body of `POST /generate-document`: the `/generate-docx` fields plus
/// the output format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatRequest {
    pub document_type: Option<String>,
    #[serde(flatten)]
    pub document: DocumentRequest,
}

impl FormatRequest {
    /// Stricter than [`DocumentRequest::validate`]: the body must contain
    /// something besides whitespace, the format must be `pdf` or `docx`, and
    /// watermark geometry must be in range.
    pub fn validate(&self) -> Result<DocumentType> {
        let content = self.document.validate()?;
        if content.trim().is_empty() {
            return Err(DocxpressError::InvalidRequest(
                "content_html cannot be empty".into(),
            ));
        }
        let kind = match self.document_type.as_deref() {
            Some(value) if !value.trim().is_empty() => DocumentType::parse(value)?,
            _ => return Err(DocxpressError::MissingField("document_type")),
        };
        self.document.validate_watermark()?;
        Ok(kind)
    }
}

/// Watermark placed behind the page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkOptions {
    /// HTML whose visible text becomes the watermark.
    pub html: String,
    pub width_pt: f64,
    pub height_pt: f64,
    /// Clockwise rotation; negative values rotate counter-clockwise.
    pub rotation_deg: f64,
    /// Fill opacity in `0.0..=1.0`.
    pub opacity: f64,
}

/// Options record handed to the document generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub orientation: Orientation,
    /// Emit a header part.
    pub header: bool,
    /// Emit a footer part.
    pub footer: bool,
    /// Render footer content only on the final page.
    pub footer_last_page_only: bool,
    pub watermark: Option<WatermarkOptions>,
    pub defaults: DocumentDefaults,
    /// Creation time written to the package's core properties.
    pub created: DateTime<Utc>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            header: true,
            footer: false,
            footer_last_page_only: false,
            watermark: None,
            defaults: DocumentDefaults::default(),
            created: Utc::now(),
        }
    }
}

impl GenerateOptions {
    /// Options for a generation request: portrait, header always on, footer
    /// on exactly when footer HTML was supplied. Watermark geometry is
    /// clamped to renderable values.
    pub fn for_request(request: &DocumentRequest, defaults: &DocumentDefaults) -> Self {
        let watermark = (!request.watermark_html().is_empty()).then(|| WatermarkOptions {
            html: request.watermark_html().to_owned(),
            width_pt: clamp_or(
                request.watermark_width(),
                WATERMARK_SIZE_LIMITS,
                DEFAULT_WATERMARK_WIDTH,
            ),
            height_pt: clamp_or(
                request.watermark_height(),
                WATERMARK_SIZE_LIMITS,
                DEFAULT_WATERMARK_HEIGHT,
            ),
            rotation_deg: Some(request.watermark_rotation())
                .filter(|deg| deg.is_finite())
                .unwrap_or(DEFAULT_WATERMARK_ROTATION),
            opacity: clamp_or(request.watermark_opacity(), (0.0, 1.0), DEFAULT_WATERMARK_OPACITY),
        });

        Self {
            orientation: Orientation::Portrait,
            header: true,
            footer: !request.footer_html().is_empty(),
            footer_last_page_only: request.footer_last_page_only(),
            watermark,
            defaults: defaults.clone(),
            created: Utc::now(),
        }
    }
}
