use crate::types::{GalleryItem, GuideStep};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One entry of `photovr.json`
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryEntry {
	pub image_url: String,
	#[serde(default)]
	pub title: String,
}

/// One entry of the guide script
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
	#[serde(alias = "audioRef")]
	pub audio: String,
	#[serde(default, alias = "captionText")]
	pub caption: String,
}

impl From<GalleryEntry> for GalleryItem {
	fn from(entry: GalleryEntry) -> Self {
		Self {
			image_url: entry.image_url,
			title: entry.title,
		}
	}
}

impl From<ScriptEntry> for GuideStep {
	fn from(entry: ScriptEntry) -> Self {
		Self {
			audio: entry.audio,
			caption: entry.caption,
		}
	}
}

pub fn parse_gallery(text: &str) -> anyhow::Result<Vec<GalleryItem>> {
	let entries: Vec<GalleryEntry> = serde_json::from_str(text)?;
	Ok(entries.into_iter().map(GalleryItem::from).collect())
}

pub fn parse_script(text: &str) -> anyhow::Result<Vec<GuideStep>> {
	let entries: Vec<ScriptEntry> = serde_json::from_str(text)?;
	Ok(entries.into_iter().map(GuideStep::from).collect())
}

/// Placeholder photos shown when the gallery list is unavailable
pub fn placeholder_gallery() -> Vec<GalleryItem> {
	(1..=16)
		.map(|i| GalleryItem {
			image_url: format!("https://placehold.co/400x300/EEE/31343C?text=Photo+{}", i),
			title: format!("作品 {:02}", i),
		})
		.collect()
}

/// Loads JSON documents from `http(s)` URLs or from disk
pub struct ContentClient {
	client: reqwest::Client,
	assets_root: PathBuf,
}

impl ContentClient {
	pub fn new(assets_root: PathBuf) -> anyhow::Result<Self> {
		let client = reqwest::Client::builder()
			.user_agent("photovr/0.1")
			.build()
			.context("building http client")?;
		Ok(Self {
			client,
			assets_root,
		})
	}

	pub async fn fetch_text(&self, locator: &str) -> anyhow::Result<String> {
		if locator.starts_with("http://") || locator.starts_with("https://") {
			log::info!("Fetching {}", locator);
			let response = self.client.get(locator).send().await?;

			let status = response.status();
			log::debug!("Response status for {}: {}", locator, status);

			if !status.is_success() {
				anyhow::bail!("Request for {} failed with status: {}", locator, status);
			}
			return Ok(response.text().await?);
		}

		let path = self.local_path(locator);
		log::info!("Reading {}", path.display());
		tokio::fs::read_to_string(&path)
			.await
			.with_context(|| format!("reading {}", path.display()))
	}

	pub async fn load_gallery(&self, locator: &str) -> anyhow::Result<Vec<GalleryItem>> {
		let text = self.fetch_text(locator).await?;
		let items = parse_gallery(&text).with_context(|| format!("parsing {}", locator))?;
		log::info!("Gallery has {} photos", items.len());
		Ok(items)
	}

	pub async fn load_script(&self, locator: &str) -> anyhow::Result<Vec<GuideStep>> {
		let text = self.fetch_text(locator).await?;
		let steps = parse_script(&text).with_context(|| format!("parsing {}", locator))?;
		log::info!("Guide script has {} steps", steps.len());
		Ok(steps)
	}

	fn local_path(&self, locator: &str) -> PathBuf {
		let path = Path::new(locator);
		if path.is_absolute() && path.exists() {
			path.to_path_buf()
		} else {
			self.assets_root.join(locator.trim_start_matches('/'))
		}
	}
}
