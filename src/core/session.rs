//! The caller-facing result of one simulated life and its read-only views.

use serde::Serialize;

use crate::core::property::PropertySnapshot;
use crate::schema::achievement::AchievementInfo;
use crate::schema::config::Settings;
use crate::schema::talent::TalentInfo;

const FILLED: char = '█';
const UNFILLED: char = '░';
pub const BAR_WIDTH: usize = 10;

/// Display glyph for a grade tier. Negative grades share tier 0's glyph and
/// everything above tier 3 shares tier 3's.
pub fn grade_glyph(grade: i32) -> &'static str {
    match grade {
        i32::MIN..=0 => "⚪",
        1 => "🔵",
        2 => "🟣",
        _ => "🟠",
    }
}

/// A ten-segment bar with `round(progress * 10)` filled segments.
pub fn progress_bar(progress: f64) -> String {
    let progress = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = ((progress * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    let mut bar = String::with_capacity(BAR_WIDTH * FILLED.len_utf8());
    bar.extend(std::iter::repeat(FILLED).take(filled));
    bar.extend(std::iter::repeat(UNFILLED).take(BAR_WIDTH - filled));
    bar
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentKind {
    #[serde(rename = "TLT")]
    Talent,
    #[serde(rename = "EVT")]
    Event,
}

/// One narrative line of a year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentLine {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub description: String,
    pub grade: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ContentLine {
    pub fn talent(info: &TalentInfo) -> Self {
        ContentLine {
            kind: ContentKind::Talent,
            description: info.description.clone(),
            grade: info.grade,
            name: Some(info.name.clone()),
        }
    }

    pub fn event(description: String, grade: i32) -> Self {
        ContentLine {
            kind: ContentKind::Event,
            description,
            grade,
            name: None,
        }
    }

    fn display(&self) -> String {
        let glyph = grade_glyph(self.grade);
        match self.name {
            Some(ref name) if !self.description.is_empty() => {
                format!("{glyph} {name}: {}", self.description)
            }
            Some(ref name) => format!("{glyph} {name}"),
            None => format!("{glyph} {}", self.description),
        }
    }
}

/// One simulated year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrajectoryEntry {
    pub age: i32,
    pub content: Vec<ContentLine>,
    pub text: String,
    pub display_text: String,
    pub properties: PropertySnapshot,
    pub is_end: bool,
}

impl TrajectoryEntry {
    pub fn new(
        age: i32,
        content: Vec<ContentLine>,
        properties: PropertySnapshot,
        is_end: bool,
    ) -> Self {
        let text = content
            .iter()
            .map(|line| line.description.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let display_text = content
            .iter()
            .map(ContentLine::display)
            .collect::<Vec<_>>()
            .join("\n");
        TrajectoryEntry {
            age,
            content,
            text,
            display_text,
            properties,
            is_end,
        }
    }

    /// Age, narrative, and stats as a block ready for display.
    pub fn formatted(&self) -> String {
        let p = &self.properties;
        let mut out = format!("Age {}\n", self.age);
        if !self.display_text.is_empty() {
            out.push_str(&self.display_text);
            out.push('\n');
        }
        out.push_str(&format!(
            "CHR {} | INT {} | STR {} | MNY {} | SPR {} | LIF {}",
            p.charm, p.intelligence, p.strength, p.money, p.spirit, p.life
        ));
        if self.is_end {
            out.push_str("\n[end]");
        }
        out
    }
}

/// A talent that swapped itself for another at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplacementRecord {
    pub source: TalentInfo,
    pub target: TalentInfo,
}

/// A judged stat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Judgement {
    /// Stat code, or "SUM" for the aggregate score.
    pub stat: String,
    pub value: i64,
    pub grade: i32,
    pub text: String,
    pub progress: f64,
    pub progress_bar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_score: i64,
    pub judges: Vec<Judgement>,
    pub talents: Vec<TalentInfo>,
}

/// Everything one simulated life produced. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSession {
    trajectory: Vec<TrajectoryEntry>,
    summary: Summary,
    new_achievements: Vec<AchievementInfo>,
    triggered_events: Vec<i32>,
    replacements: Vec<ReplacementRecord>,
    #[serde(skip)]
    page_size: usize,
}

impl GameSession {
    pub(crate) fn new(
        trajectory: Vec<TrajectoryEntry>,
        summary: Summary,
        new_achievements: Vec<AchievementInfo>,
        triggered_events: Vec<i32>,
        replacements: Vec<ReplacementRecord>,
    ) -> Self {
        GameSession {
            trajectory,
            summary,
            new_achievements,
            triggered_events,
            replacements,
            page_size: Settings::default().page_size,
        }
    }

    pub(crate) fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn trajectory(&self) -> &[TrajectoryEntry] {
        &self.trajectory
    }

    pub fn total_years(&self) -> usize {
        self.trajectory.len()
    }

    /// Number of pages of `per_page` years; zero when `per_page` is zero.
    pub fn total_pages(&self, per_page: usize) -> usize {
        if per_page == 0 {
            return 0;
        }
        self.trajectory.len().div_ceil(per_page)
    }

    pub fn final_age(&self) -> Option<i32> {
        self.trajectory.last().map(|entry| entry.age)
    }

    pub fn is_ended(&self) -> bool {
        self.trajectory.last().is_some_and(|entry| entry.is_end)
    }

    pub fn total_score(&self) -> i64 {
        self.summary.total_score
    }

    pub fn year(&self, index: usize) -> Option<&TrajectoryEntry> {
        self.trajectory.get(index)
    }

    /// Entries `start..end`, clamped to the trajectory.
    pub fn years_range(&self, start: usize, end: usize) -> &[TrajectoryEntry] {
        let end = end.min(self.trajectory.len());
        let start = start.min(end);
        &self.trajectory[start..end]
    }

    /// Page `page` (1-indexed) of `per_page` years. Page 0 is empty.
    pub fn page(&self, page: usize, per_page: usize) -> &[TrajectoryEntry] {
        if page == 0 || per_page == 0 {
            return &[];
        }
        let start = (page - 1).saturating_mul(per_page);
        self.years_range(start, start.saturating_add(per_page))
    }

    /// Years per page as configured when the life was simulated.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages at the configured page size.
    pub fn page_count(&self) -> usize {
        self.total_pages(self.page_size)
    }

    /// Page `page` (1-indexed) at the configured page size.
    pub fn page_at(&self, page: usize) -> &[TrajectoryEntry] {
        self.page(page, self.page_size)
    }

    pub fn year_formatted(&self, index: usize) -> Option<String> {
        self.year(index).map(TrajectoryEntry::formatted)
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn new_achievements(&self) -> &[AchievementInfo] {
        &self.new_achievements
    }

    pub fn triggered_events(&self) -> &[i32] {
        &self.triggered_events
    }

    pub fn replacements(&self) -> &[ReplacementRecord] {
        &self.replacements
    }

    /// The result as a plain nested mapping.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
