//! Plain terminal presenter.
//!
//! Renders each page model as a flat text section to the wrapped writer.
//! There is no cursor addressing or layout engine — each render replaces
//! the previous view with a fresh block, which is enough for a line-based
//! terminal front end and keeps the controller fully testable.

use std::io::Write;

use chrono::{DateTime, Local, Utc};

use super::{ArticlePage, FeedPage, HomePage, MatchCenterPage, Presenter};
use crate::api::{Article, Timestamp};
use crate::util::{clip_summary, truncate_to_width};

const RULE: &str = "────────────────────────────────────────────────────────────";
const TITLE_WIDTH: usize = 72;
const SUMMARY_CHARS: usize = 160;

/// Line-oriented presenter writing to any `Write` target.
pub struct TextPresenter<W: Write> {
    out: W,
}

impl TextPresenter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> TextPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn line(&mut self, s: &str) {
        // A broken pipe on stdout is not worth surfacing to the controller
        let _ = writeln!(self.out, "{s}");
    }

    fn heading(&mut self, title: &str) {
        self.line("");
        self.line(title);
        self.line(RULE);
    }

    fn card(&mut self, index: Option<usize>, article: &Article) {
        let prefix = match index {
            Some(i) => format!("{i:>3}. "),
            None => "     ".to_string(),
        };
        let title = truncate_to_width(&article.title, TITLE_WIDTH);
        self.line(&format!("{prefix}{title}"));

        let mut meta = Vec::new();
        if !article.feed.is_empty() {
            meta.push(article.feed.to_uppercase());
        }
        if !article.source.is_empty() {
            meta.push(article.source.clone());
        }
        if let Some(t) = fmt_time(article.published_at) {
            meta.push(t);
        }
        if !meta.is_empty() {
            self.line(&format!("     {}", meta.join(" • ")));
        }
        let summary = clip_summary(&article.summary, SUMMARY_CHARS);
        if !summary.is_empty() {
            self.line(&format!("     {summary}"));
        }
    }
}

fn fmt_time(ts: Timestamp) -> Option<String> {
    ts.at()
        .map(|t| t.with_timezone(&Local).format("%a %b %d %H:%M").to_string())
}

fn fmt_kickoff(millis: Option<i64>) -> Option<String> {
    let millis = millis?;
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&Local).format("%a %b %d %H:%M").to_string())
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn render_home(&mut self, page: HomePage) {
        self.heading("NEWSDESK — HOME");

        match &page.breaking {
            Some(breaking) => {
                self.line("");
                self.line("⚡ BREAKING");
                self.card(None, breaking);
            }
            None => self.line("No articles available right now."),
        }

        if !page.hero.is_empty() {
            self.heading("Top Stories");
            for (i, article) in page.hero.iter().enumerate() {
                self.card(Some(i + 1), article);
            }
        }

        if !page.latest.is_empty() {
            self.heading("Latest Updates");
            for article in &page.latest {
                let title = truncate_to_width(&article.title, TITLE_WIDTH);
                self.line(&format!("  • {title}"));
            }
        }

        if !page.more.is_empty() {
            self.heading("More Stories");
            for (i, article) in page.more.iter().enumerate() {
                self.card(Some(page.hero.len() + i + 1), article);
            }
        }

        self.line("");
        self.line(&format!("({} stories composed)", page.total));
    }

    fn render_feed(&mut self, page: FeedPage) {
        if !page.append {
            self.heading(&format!("NEWSDESK — {}", page.label.to_uppercase()));
        }
        if page.items.is_empty() {
            self.line("Nothing to show yet.");
            return;
        }
        for (i, article) in page.items.iter().enumerate() {
            self.card(Some(i + 1), article);
        }
    }

    fn render_article(&mut self, page: ArticlePage) {
        let a = &page.article;
        self.heading(&a.title);

        let mut meta = Vec::new();
        if !a.source.is_empty() {
            meta.push(a.source.clone());
        }
        if let Some(t) = fmt_time(a.published_at) {
            meta.push(t);
        }
        if let Some(author) = &a.author {
            meta.push(author.clone());
        }
        if !meta.is_empty() {
            self.line(&meta.join(" • "));
        }
        if let Some(hero) = &page.hero_image {
            self.line(&format!("[image] {hero}"));
        }
        if !a.summary.is_empty() {
            self.line("");
            self.line(&a.summary);
        }

        self.line("");
        match &a.content {
            Some(content) => self.line(content),
            None => {
                self.line("Full content isn't available from the extractor yet.");
                if let Some(src) = &page.source_url {
                    self.line(&format!("Read original source: {src}"));
                }
            }
        }
    }

    fn render_match_center(&mut self, page: MatchCenterPage) {
        self.heading("NEWSDESK — MATCH CENTER");

        if page.records.is_empty() {
            self.line("No saved matches. Use `mc add` to start saving picks.");
            return;
        }

        for record in &page.records {
            let marker = if page.selected.as_deref() == Some(record.id.as_str()) {
                ">"
            } else {
                " "
            };
            let league = if record.league.is_empty() {
                "Match"
            } else {
                &record.league
            };
            let confidence = record
                .confidence
                .map(|c| format!(" {c}%"))
                .unwrap_or_default();
            let kickoff = fmt_kickoff(record.kickoff)
                .map(|t| format!("  {t}"))
                .unwrap_or_default();
            self.line(&format!(
                "{marker} [{}] {} vs {} — {}{}{}",
                league,
                record.home,
                record.away,
                record.pick.label(),
                confidence,
                kickoff,
            ));
            if !record.notes.is_empty() {
                self.line(&format!("    {}", clip_summary(&record.notes, SUMMARY_CHARS)));
            } else if page.selected.as_deref() == Some(record.id.as_str()) {
                // Offer the starter template for the record being edited
                for line in crate::predictions::analysis_template(record).lines() {
                    self.line(&format!("    {line}"));
                }
            }
        }
    }

    fn set_status(&mut self, message: &str) {
        if !message.is_empty() {
            self.line(&format!("[{message}]"));
        }
    }

    fn mark_refreshed(&mut self, at: DateTime<Utc>) {
        self.line(&format!(
            "Last refreshed {}",
            at.with_timezone(&Local).format("%H:%M:%S")
        ));
    }
}
