//! Marker-line substitution for the agent configuration template.
//!
//! A marker is a line consisting of exactly `Key=` with no value. Rendering
//! appends the resolved value to each marker and leaves every other line
//! byte-identical, so a line that already carries a value is never touched.

use std::fmt;

use serde::Serialize;

use crate::rules::ConfigAssignment;

/// Configuration keys completed during rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerKey {
    /// `HostInterface=`
    HostInterface,
    /// `Hostname=`
    Hostname,
    /// `Server=`
    Server,
    /// `ServerActive=`
    ServerActive,
    /// `HostMetaData=`
    HostMetaData,
}

impl MarkerKey {
    /// Every marker, in the order they are reported.
    pub const ALL: [Self; 5] = [
        Self::HostInterface,
        Self::Hostname,
        Self::Server,
        Self::ServerActive,
        Self::HostMetaData,
    ];

    /// The exact marker line.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::HostInterface => "HostInterface=",
            Self::Hostname => "Hostname=",
            Self::Server => "Server=",
            Self::ServerActive => "ServerActive=",
            Self::HostMetaData => "HostMetaData=",
        }
    }

    fn from_line(line: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.marker() == line)
    }
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.marker().trim_end_matches('='))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TemplateLine {
    raw: String,
    marker: Option<MarkerKey>,
}

/// Line terminator used by a template and preserved in its rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Framing of the template text that is not part of any line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TextLayout {
    line_ending: LineEnding,
    byte_order_mark: bool,
    final_newline: bool,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            line_ending: LineEnding::default(),
            byte_order_mark: false,
            final_newline: true,
        }
    }
}

/// Ordered template lines with their recognised markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigTemplate {
    lines: Vec<TemplateLine>,
    layout: TextLayout,
}

impl ConfigTemplate {
    /// Builds a template from individual lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines
            .into_iter()
            .map(|line| {
                let raw = line.into();
                let marker = MarkerKey::from_line(&raw);
                TemplateLine { raw, marker }
            })
            .collect();
        Self {
            lines,
            layout: TextLayout::default(),
        }
    }

    /// Parses template text, remembering its line ending.
    ///
    /// A leading byte order mark is set aside before markers are matched and
    /// restored on output, as is the presence of a final newline.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let (byte_order_mark, body) = match text.strip_prefix(BYTE_ORDER_MARK) {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let line_ending = if body.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        };
        let mut template = Self::from_lines(body.lines());
        template.layout = TextLayout {
            line_ending,
            byte_order_mark,
            final_newline: body.ends_with('\n'),
        };
        template
    }

    /// Number of lines in the template.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the template has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn contains(&self, key: MarkerKey) -> bool {
        self.lines.iter().any(|line| line.marker == Some(key))
    }
}

/// Values substituted into the template.
#[derive(Debug, Clone, Copy)]
pub struct RenderValues<'a> {
    /// Resolved routing values.
    pub assignment: &'a ConfigAssignment,
    /// Address the agent binds to.
    pub interface_addr: &'a str,
    /// Host name reported by the agent.
    pub host_name: &'a str,
}

impl RenderValues<'_> {
    fn value_for(&self, key: MarkerKey) -> &str {
        match key {
            MarkerKey::HostInterface => self.interface_addr,
            MarkerKey::Hostname => self.host_name,
            MarkerKey::Server => &self.assignment.server,
            MarkerKey::ServerActive => &self.assignment.server_active,
            MarkerKey::HostMetaData => &self.assignment.host_metadata,
        }
    }
}

/// Template mismatch that leaves a value unset without failing the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TemplateWarning {
    /// The template has no marker line for the key.
    MissingMarker(MarkerKey),
}

impl fmt::Display for TemplateWarning {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMarker(key) => write!(
                formatter,
                "template has no '{}' line; {key} is left unset",
                key.marker()
            ),
        }
    }
}

/// Final configuration content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfig {
    lines: Vec<String>,
    layout: TextLayout,
    warnings: Vec<TemplateWarning>,
}

impl RenderedConfig {
    /// Rendered lines in template order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Template mismatches detected while rendering.
    #[must_use]
    pub fn warnings(&self) -> &[TemplateWarning] {
        &self.warnings
    }

    /// Markers absent from the template.
    pub fn missing_markers(&self) -> impl Iterator<Item = MarkerKey> + '_ {
        self.warnings.iter().map(|warning| match warning {
            TemplateWarning::MissingMarker(key) => *key,
        })
    }

    /// Serialises the lines with the template's line ending and framing.
    #[must_use]
    pub fn to_text(&self) -> String {
        let ending = self.layout.line_ending.as_str();
        let mut text = String::new();
        if self.layout.byte_order_mark {
            text.push(BYTE_ORDER_MARK);
        }
        text.push_str(&self.lines.join(ending));
        if self.layout.final_newline && !self.lines.is_empty() {
            text.push_str(ending);
        }
        text
    }
}

/// Completes every marker line of `template` with its value.
#[must_use]
pub fn render(template: &ConfigTemplate, values: RenderValues<'_>) -> RenderedConfig {
    let lines = template
        .lines
        .iter()
        .map(|line| match line.marker {
            Some(key) => format!("{}{}", line.raw, values.value_for(key)),
            None => line.raw.clone(),
        })
        .collect();
    let warnings: Vec<TemplateWarning> = MarkerKey::ALL
        .into_iter()
        .filter(|key| !template.contains(*key))
        .map(TemplateWarning::MissingMarker)
        .collect();
    for warning in &warnings {
        tracing::warn!(target: "agent_provision::template", %warning, "template mismatch");
    }
    RenderedConfig {
        lines,
        layout: template.layout,
        warnings,
    }
}
