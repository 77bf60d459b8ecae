use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use tracing::{error, info};

use crate::cli::ExecutiveOrdersArgs;
use crate::http::{browser_headers, build_client};
use crate::sheet::{SheetLayout, Table, write_table};
use crate::util::{duration_from_secs, pause};

const SHEET_NAME: &str = "Executive Orders";
const COLUMNS: [&str; 2] = ["Executive Order Number", "First 300 Words"];

/// Pulls the opening words out of a Federal Register executive order page.
pub struct OrderPageParser {
    article: Selector,
    fallback: Selector,
    word: Regex,
    word_limit: usize,
}

impl OrderPageParser {
    pub fn new(word_limit: usize) -> Result<Self> {
        Ok(Self {
            article: parse_selector(".article-body")?,
            fallback: parse_selector("main")?,
            word: Regex::new(r"\b\w+\b").context("failed to compile word regex")?,
            word_limit,
        })
    }

    /// First `word_limit` words of the article body, or of `main` when the page
    /// has no article body. `None` when neither element exists.
    pub fn opening_words(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let element = document
            .select(&self.article)
            .next()
            .or_else(|| document.select(&self.fallback).next())?;

        let text = element.text().collect::<Vec<&str>>().join(" ");
        Some(self.first_words(&text))
    }

    pub fn first_words(&self, text: &str) -> String {
        self.word
            .find_iter(text)
            .take(self.word_limit)
            .map(|found| found.as_str())
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

fn parse_selector(selector: &'static str) -> Result<Selector> {
    Selector::parse(selector).map_err(|err| anyhow!("invalid css selector '{selector}': {err}"))
}

pub fn run(args: ExecutiveOrdersArgs) -> Result<()> {
    if args.start > args.end {
        bail!("--start {} is after --end {}", args.start, args.end);
    }

    let client = build_client(
        Duration::from_secs(args.timeout_secs),
        browser_headers("text/html,application/xhtml+xml"),
    )?;
    let parser = OrderPageParser::new(args.word_limit)?;
    let between_requests = duration_from_secs(args.pause_secs, "--pause-secs")?;

    let mut table = Table::new(COLUMNS);
    let mut failures = 0usize;

    for number in args.start..=args.end {
        let url = format!("{}{}", args.base_url, number);
        info!(order = number, url = %url, "fetching executive order");

        match fetch_opening_words(&client, &parser, &url) {
            Ok(words) => table.push_row([format!("EO {number}"), words]),
            Err(err) => {
                error!(order = number, error = %format!("{err:#}"), "skipping executive order");
                failures += 1;
            }
        }

        if number < args.end {
            pause(between_requests);
        }
    }

    let layout = SheetLayout {
        sheet_name: Some(SHEET_NAME.to_string()),
        ..SheetLayout::default()
    };
    write_table(&args.output, &table, &layout)?;
    info!(
        path = %args.output.display(),
        orders = table.len(),
        failures,
        "saved executive orders"
    );

    Ok(())
}

fn fetch_opening_words(client: &Client, parser: &OrderPageParser, url: &str) -> Result<String> {
    let html = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .with_context(|| format!("failed to fetch {url}"))?;

    parser
        .opening_words(&html)
        .with_context(|| format!("no article body or main element in {url}"))
}
