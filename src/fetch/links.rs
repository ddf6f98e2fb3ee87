// src/fetch/links.rs

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, trace};
use url::Url;

use crate::config::{Config, FORCE_DOWNLOAD_MARKER};
use crate::error::CheckerError;

/// The workbook chosen from the publication page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub remote_url: Url,
    pub local_file_name: String,
}

/// What identifies the dataset among all links on the page.
#[derive(Debug, Clone, Copy)]
pub struct LinkRules<'a> {
    pub dataset_path: &'a str,
    pub file_name_marker: &'a str,
}

impl<'a> From<&'a Config> for LinkRules<'a> {
    fn from(cfg: &'a Config) -> Self {
        Self {
            dataset_path: &cfg.dataset_path,
            file_name_marker: &cfg.file_name_marker,
        }
    }
}

/// GET `page_url` and return every anchor `href` in document order.
#[instrument(level = "info", skip(client))]
pub async fn fetch_listing(client: &Client, page_url: &Url) -> Result<Vec<String>> {
    let html = client
        .get(page_url.clone())
        .send()
        .await
        .with_context(|| format!("GET {}", page_url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", page_url))?
        .text()
        .await
        .with_context(|| format!("reading body from {}", page_url))?;

    let links = anchor_targets(&html);
    debug!(count = links.len(), "collected anchors");
    Ok(links)
}

pub fn anchor_targets(html: &str) -> Vec<String> {
    let selector = Selector::parse("a[href]").expect("selector should parse");
    Html::parse_document(html)
        .select(&selector)
        .filter_map(|e| e.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Pick the dataset link out of `links`. If more than one qualifies the last
/// one on the page is used.
pub fn resolve(
    links: &[String],
    page_url: &Url,
    rules: LinkRules<'_>,
) -> Result<ResolvedFile, CheckerError> {
    let no_match = || CheckerError::NoMatchingFile {
        page: page_url.to_string(),
    };

    let href = links
        .iter()
        .filter(|l| l.contains(rules.dataset_path) && l.contains(FORCE_DOWNLOAD_MARKER))
        .inspect(|l| trace!(href = %l, "candidate"))
        .last()
        .ok_or_else(no_match)?;

    let local_file_name = clean_file_name(href, rules.file_name_marker).ok_or_else(no_match)?;
    if local_file_name.is_empty() || local_file_name.contains(['/', '\\']) {
        return Err(CheckerError::UnsafeFileName(local_file_name));
    }

    let remote_url = page_url.join(href).map_err(|_| no_match())?;
    Ok(ResolvedFile {
        remote_url,
        local_file_name,
    })
}

/// `...govscot%3Adocument/COVID-19%2Bdaily%2Bdata%2B-%2Bby%2BNHS%2BBoard%2B-%2B25%2BOctober%2B2020.xlsx?forceDownload=true`
/// becomes `COVID-19-25October2020.xlsx`.
fn clean_file_name(href: &str, marker: &str) -> Option<String> {
    let start = href.find(marker)?;
    Some(
        href[start..]
            .replace("%2B", "")
            .replace("?forceDownload=true", "")
            .replace("dailydata-byNHSBoard", ""),
    )
}

/// Fetch the publication page and resolve the current workbook.
pub async fn resolve_latest(client: &Client, cfg: &Config) -> Result<ResolvedFile> {
    let page_url =
        Url::parse(&cfg.page_url).with_context(|| format!("parsing page URL {}", cfg.page_url))?;
    let links = fetch_listing(client, &page_url).await?;
    let resolved = resolve(&links, &page_url, LinkRules::from(cfg))?;
    info!(file = %resolved.local_file_name, url = %resolved.remote_url, "resolved current workbook");
    Ok(resolved)
}

/// `25%2BOctober%2B2020` when `url_encoded`, otherwise `25October2020`.
pub fn formatted_date(date: NaiveDate, url_encoded: bool) -> String {
    let sep = if url_encoded { "%2B" } else { "" };
    format!(
        "{}{sep}{}{sep}{}",
        date.format("%d"),
        date.format("%B"),
        date.format("%Y")
    )
}

/// The download URL the publisher uses for the workbook of `date`.
pub fn dated_file_url(date: NaiveDate) -> Result<Url> {
    let raw = format!(
        "https://www.gov.scot/binaries/content/documents/govscot/publications/statistics/2020/04/coronavirus-covid-19-trends-in-daily-data/documents/covid-19-data-by-nhs-board/covid-19-data-by-nhs-board/govscot%3Adocument/COVID-19%2Bdaily%2Bdata%2B-%2Bby%2BNHS%2BBoard%2B-%2B{}.xlsx?forceDownload=true",
        formatted_date(date, true)
    );
    Ok(Url::parse(&raw)?)
}
