//! Statistics derived from stored entries.
//!
//! Everything here is a pure function of the entries and the current date.
//! Reports cover overall activity, patterns over the most recent entries,
//! tag trends over the last week, writing times, and simple habit signals
//! read from tags and message text.

use crate::constants::RECENT_WINDOW_DAYS;
use crate::journal::Entry;
use chrono::{Duration, NaiveDate, Timelike};
use std::collections::BTreeMap;
use std::fmt;

/// Number of most recent entries scanned for patterns.
const PATTERN_WINDOW: usize = 7;
/// A tag must appear on at least this many days to count as a pattern.
const PATTERN_MIN_DAYS: usize = 3;
const HIGH_WORDS_PER_DAY: f64 = 100.0;
const MODERATE_WORDS_PER_DAY: f64 = 50.0;
const TOP_EMOTIONS: usize = 5;
const TOP_THEMES: usize = 10;

const SLEEP_KEYWORDS: &[&str] = &["sleep", "slept", "tired", "rest", "insomnia", "woke up"];
const GOOD_SLEEP: &[&str] = &["slept well", "well rested", "good sleep"];
const BAD_SLEEP: &[&str] = &["slept badly", "didn't sleep", "couldn't sleep", "insomnia"];

const STRESS_EMOTIONS: &[&str] = &["anxious", "nervous", "overwhelmed", "frustrated", "annoyed"];
const CALM_EMOTIONS: &[&str] = &["calm", "relaxed", "serene", "at peace"];
const PRODUCTIVE_EMOTIONS: &[&str] = &["productive", "focused", "active", "efficient", "motivated"];
const UNPRODUCTIVE_EMOTIONS: &[&str] = &["bored", "empty", "apathetic", "listless"];
const SOCIAL_THEMES: &[&str] = &["relationships", "partner", "family", "friendship"];

/// Short description of the dominant emotion.
pub fn mood_label(emotion: &str) -> &'static str {
    match emotion {
        "happy" => "Positive",
        "cheerful" => "Good spirits",
        "content" => "Satisfied",
        "sad" => "Needs support",
        "melancholic" => "Reflective",
        "anxious" => "High activation",
        "nervous" => "On alert",
        "frustrated" => "Emotional tension",
        "annoyed" => "Irritable",
        "calm" => "Balanced",
        "relaxed" => "At peace",
        "confused" => "Processing",
        "lost" => "Seeking clarity",
        _ => "Neutral",
    }
}

/// A tag and how many entries carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
    /// Count relative to the most frequent tag, 0-100.
    pub percent: u32,
}

/// A pattern noticed in the most recent entries.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    DominantEmotion { tag: String, days: usize },
    RecurringTheme { tag: String, days: usize },
    HighExpressiveness { words_per_day: f64 },
    ModerateExpressiveness { words_per_day: f64 },
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::DominantEmotion { tag, days } => {
                write!(f, "Dominant emotion: {} ({} days)", tag, days)
            }
            Pattern::RecurringTheme { tag, days } => {
                write!(f, "Recurring theme: {} ({} days)", tag, days)
            }
            Pattern::HighExpressiveness { words_per_day } => write!(
                f,
                "High expressiveness: {:.0} words per day on average",
                words_per_day
            ),
            Pattern::ModerateExpressiveness { words_per_day } => write!(
                f,
                "Moderate expressiveness: {:.0} words per day on average",
                words_per_day
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepQuality {
    NoMentions,
    Good,
    Regular,
    NeedsAttention,
}

/// Three-step level used by the stress and productivity signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    NoData,
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialActivity {
    Quiet,
    Moderate,
    Active,
    VeryActive,
}

/// Habit signals over the last week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Habits {
    pub sleep: SleepQuality,
    pub stress: Level,
    pub productivity: Level,
    pub social: SocialActivity,
}

/// Full insight report.
#[derive(Debug, Clone, PartialEq)]
pub struct Insights {
    pub active_days: usize,
    pub total_words: usize,
    pub analyses: usize,
    /// First two emotions of today's entry.
    pub current_state: Vec<String>,
    pub mood: &'static str,
    pub patterns: Vec<Pattern>,
    pub emotion_trends: Vec<TagCount>,
    pub theme_trends: Vec<TagCount>,
    /// Hour (UTC) with the most user messages.
    pub most_active_hour: Option<u32>,
    pub avg_messages_per_day: f64,
    pub habits: Habits,
    /// Days written in the last week.
    pub consistency_days: usize,
}

/// Computes every insight from `entries` as of `today`.
pub fn compute<'a>(entries: impl IntoIterator<Item = &'a Entry>, today: NaiveDate) -> Insights {
    let mut active: Vec<&Entry> = entries.into_iter().filter(|e| e.has_messages()).collect();
    active.sort_by(|a, b| b.date().cmp(a.date()));

    let today_entry = active
        .iter()
        .find(|e| e.calendar_date() == Some(today))
        .copied();
    let current_state: Vec<String> = today_entry
        .map(|e| e.emotions().iter().take(2).cloned().collect())
        .unwrap_or_default();
    let mood = match today_entry.and_then(|e| e.emotions().first()) {
        Some(dominant) => mood_label(dominant),
        None => "Waiting for analysis",
    };

    let recent = recent_entries(&active, today);
    let message_count: usize = active.iter().map(|e| e.user_message_count()).sum();

    Insights {
        active_days: active.len(),
        total_words: active.iter().map(|e| e.word_count()).sum(),
        analyses: active.iter().filter(|e| e.has_summary()).count(),
        current_state,
        mood,
        patterns: patterns(&active[..active.len().min(PATTERN_WINDOW)]),
        emotion_trends: top_tags(recent.iter().flat_map(|e| e.emotions()), TOP_EMOTIONS),
        theme_trends: top_tags(recent.iter().flat_map(|e| e.themes()), TOP_THEMES),
        most_active_hour: most_active_hour(&active),
        avg_messages_per_day: if active.is_empty() {
            0.0
        } else {
            message_count as f64 / active.len() as f64
        },
        habits: habits(&recent),
        consistency_days: recent.len(),
    }
}

/// Entries with messages dated within the last seven calendar days, today
/// included, newest first.
pub fn recent_entries<'a>(active: &[&'a Entry], today: NaiveDate) -> Vec<&'a Entry> {
    let cutoff = today - Duration::days(RECENT_WINDOW_DAYS - 1);
    active
        .iter()
        .filter(|e| e.has_messages())
        .filter(|e| {
            e.calendar_date()
                .is_some_and(|d| d >= cutoff && d <= today)
        })
        .copied()
        .collect()
}

fn count_tags<'a>(tags: impl Iterator<Item = &'a String>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for tag in tags {
        match counts.iter_mut().find(|(t, _)| t == tag) {
            Some((_, count)) => *count += 1,
            None => counts.push((tag.clone(), 1)),
        }
    }
    // Stable: ties keep first-seen order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn top_tags<'a>(tags: impl Iterator<Item = &'a String>, limit: usize) -> Vec<TagCount> {
    let counts = count_tags(tags);
    let max = counts.first().map(|(_, c)| *c).unwrap_or(0);
    counts
        .into_iter()
        .take(limit)
        .map(|(tag, count)| TagCount {
            tag,
            count,
            percent: if max == 0 {
                0
            } else {
                (count * 100 / max) as u32
            },
        })
        .collect()
}

fn patterns(entries: &[&Entry]) -> Vec<Pattern> {
    let mut found = Vec::new();
    if entries.is_empty() {
        return found;
    }

    if let Some((tag, days)) = count_tags(entries.iter().flat_map(|e| e.emotions()))
        .into_iter()
        .next()
        .filter(|(_, days)| *days >= PATTERN_MIN_DAYS)
    {
        found.push(Pattern::DominantEmotion { tag, days });
    }

    if let Some((tag, days)) = count_tags(entries.iter().flat_map(|e| e.themes()))
        .into_iter()
        .next()
        .filter(|(_, days)| *days >= PATTERN_MIN_DAYS)
    {
        found.push(Pattern::RecurringTheme { tag, days });
    }

    let words: usize = entries.iter().map(|e| e.word_count()).sum();
    let words_per_day = words as f64 / entries.len() as f64;
    if words_per_day > HIGH_WORDS_PER_DAY {
        found.push(Pattern::HighExpressiveness { words_per_day });
    } else if words_per_day > MODERATE_WORDS_PER_DAY {
        found.push(Pattern::ModerateExpressiveness { words_per_day });
    }

    found
}

fn most_active_hour(entries: &[&Entry]) -> Option<u32> {
    let mut by_hour: BTreeMap<u32, usize> = BTreeMap::new();
    for message in entries.iter().flat_map(|e| e.user_messages()) {
        *by_hour.entry(message.timestamp.hour()).or_default() += 1;
    }
    // Earliest hour wins ties.
    by_hour
        .into_iter()
        .fold(None, |best: Option<(u32, usize)>, (hour, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((hour, count)),
        })
        .map(|(hour, _)| hour)
}

fn habits(recent: &[&Entry]) -> Habits {
    let emotions: Vec<&str> = recent
        .iter()
        .flat_map(|e| e.emotions())
        .map(String::as_str)
        .collect();
    let themes: Vec<&str> = recent
        .iter()
        .flat_map(|e| e.themes())
        .map(String::as_str)
        .collect();
    let stress = if emotions.is_empty() {
        Level::NoData
    } else {
        let stressed = count_in(&emotions, STRESS_EMOTIONS);
        let calm = count_in(&emotions, CALM_EMOTIONS);
        if stressed > calm * 2 {
            Level::High
        } else if calm > stressed {
            Level::Low
        } else {
            Level::Moderate
        }
    };

    let productivity = if emotions.is_empty() {
        Level::NoData
    } else {
        let productive = count_in(&emotions, PRODUCTIVE_EMOTIONS);
        let unproductive = count_in(&emotions, UNPRODUCTIVE_EMOTIONS);
        if productive > unproductive {
            Level::High
        } else if unproductive > productive {
            Level::Low
        } else {
            Level::Moderate
        }
    };

    let social = match count_in(&themes, SOCIAL_THEMES) {
        0 => SocialActivity::Quiet,
        n if n >= 5 => SocialActivity::VeryActive,
        n if n >= 3 => SocialActivity::Active,
        _ => SocialActivity::Moderate,
    };

    Habits {
        sleep: sleep_quality(recent),
        stress,
        productivity,
        social,
    }
}

fn count_in(tags: &[&str], set: &[&str]) -> usize {
    tags.iter().filter(|t| set.contains(*t)).count()
}

fn sleep_quality(recent: &[&Entry]) -> SleepQuality {
    let mut mentions = 0;
    let mut good = 0;
    let mut bad = 0;

    for entry in recent {
        let text = entry.analysis_input().to_lowercase();
        for keyword in SLEEP_KEYWORDS {
            if !text.contains(keyword) {
                continue;
            }
            mentions += 1;
            if GOOD_SLEEP.iter().any(|k| text.contains(k)) {
                good += 1;
            } else if BAD_SLEEP.iter().any(|k| text.contains(k)) {
                bad += 1;
            }
        }
    }

    if mentions == 0 {
        SleepQuality::NoMentions
    } else if good > bad {
        SleepQuality::Good
    } else if bad > good {
        SleepQuality::NeedsAttention
    } else {
        SleepQuality::Regular
    }
}

impl fmt::Display for SleepQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SleepQuality::NoMentions => "no mentions",
            SleepQuality::Good => "good",
            SleepQuality::Regular => "regular",
            SleepQuality::NeedsAttention => "needs attention",
        })
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::NoData => "no data",
            Level::Low => "low",
            Level::Moderate => "moderate",
            Level::High => "high",
        })
    }
}

impl fmt::Display for SocialActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SocialActivity::Quiet => "quiet",
            SocialActivity::Moderate => "moderate",
            SocialActivity::Active => "active",
            SocialActivity::VeryActive => "very active",
        })
    }
}

fn write_trend(f: &mut fmt::Formatter<'_>, trend: &TagCount) -> fmt::Result {
    let bar = "#".repeat((trend.percent as usize).div_ceil(10));
    writeln!(f, "  {:<14} {:<10} {}", trend.tag, bar, trend.count)
}

impl fmt::Display for Insights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Overview")?;
        writeln!(f, "  Active days:        {}", self.active_days)?;
        writeln!(f, "  Total words:        {}", self.total_words)?;
        writeln!(f, "  Analyses completed: {}", self.analyses)?;
        if self.current_state.is_empty() {
            writeln!(f, "  Current state:      No data for today")?;
        } else {
            writeln!(f, "  Current state:      {}", self.current_state.join(", "))?;
        }
        writeln!(f, "  Mood:               {}", self.mood)?;

        writeln!(f, "\nRecent patterns")?;
        if self.patterns.is_empty() {
            writeln!(f, "  Not enough data to detect patterns")?;
        }
        for pattern in &self.patterns {
            writeln!(f, "  {}", pattern)?;
        }

        writeln!(f, "\nEmotion trends (last 7 days)")?;
        if self.emotion_trends.is_empty() {
            writeln!(f, "  Not enough emotional data")?;
        }
        for trend in &self.emotion_trends {
            write_trend(f, trend)?;
        }

        writeln!(f, "\nTheme trends (last 7 days)")?;
        if self.theme_trends.is_empty() {
            writeln!(f, "  No recurring themes yet")?;
        } else {
            let tags: Vec<&str> = self.theme_trends.iter().map(|t| t.tag.as_str()).collect();
            writeln!(f, "  {}", tags.join(", "))?;
        }

        writeln!(f, "\nTime patterns")?;
        match self.most_active_hour {
            Some(hour) => writeln!(f, "  Most active hour:   {:02}:00 UTC", hour)?,
            None => writeln!(f, "  Most active hour:   no data")?,
        }
        writeln!(
            f,
            "  Messages per day:   {:.1}",
            self.avg_messages_per_day
        )?;

        writeln!(f, "\nHabits (last 7 days)")?;
        writeln!(f, "  Sleep:              {}", self.habits.sleep)?;
        writeln!(f, "  Stress:             {}", self.habits.stress)?;
        writeln!(f, "  Productivity:       {}", self.habits.productivity)?;
        writeln!(f, "  Social:             {}", self.habits.social)?;
        write!(f, "  Consistency goal:   {}/7 days", self.consistency_days)
    }
}
