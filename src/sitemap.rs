//! Sitemap stage.
//!
//! The site's routes are fixed; only the base URL and the generation date
//! vary. Every entry's `lastmod` is the generation date.

use crate::config::BuildConfig;
use crate::types::GeneratedArtifact;
use chrono::NaiveDate;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// File name of the sitemap under the output root.
pub const SITEMAP_FILE_NAME: &str = "sitemap.xml";

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Change frequency for sitemap entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Weekly,
    Monthly,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// A route published in the sitemap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    /// Path joined onto the base URL.
    pub path: &'static str,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

/// Home, project listing and registration pages.
pub const ROUTES: [Route; 3] = [
    Route {
        path: "/",
        changefreq: ChangeFreq::Weekly,
        priority: 1.0,
    },
    Route {
        path: "/projetos",
        changefreq: ChangeFreq::Weekly,
        priority: 0.8,
    },
    Route {
        path: "/cadastro",
        changefreq: ChangeFreq::Monthly,
        priority: 0.7,
    },
];

/// Render the sitemap document.
pub fn render_sitemap(base_url: &str, date: NaiveDate) -> String {
    let base = base_url.trim_end_matches('/');
    let lastmod = date.format("%Y-%m-%d");

    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    xml.push('\n');
    for route in &ROUTES {
        // Writing into a String cannot fail.
        let _ = write!(
            xml,
            "    <url>\n        <loc>{base}{}</loc>\n        <lastmod>{lastmod}</lastmod>\n        <changefreq>{}</changefreq>\n        <priority>{:.1}</priority>\n    </url>\n",
            route.path,
            route.changefreq.as_str(),
            route.priority,
        );
    }
    xml.push_str("</urlset>");
    xml
}

/// Run the sitemap stage for generation date `today`.
pub fn generate_sitemap(
    config: &BuildConfig,
    today: NaiveDate,
) -> Result<GeneratedArtifact, SitemapError> {
    let xml = render_sitemap(&config.sitemap.base_url, today);
    let dest = config.output.join(SITEMAP_FILE_NAME);
    let write_err = |e| SitemapError::Write {
        path: dest.clone(),
        source: e,
    };
    fs::create_dir_all(&config.output).map_err(write_err)?;
    fs::write(&dest, &xml).map_err(write_err)?;

    Ok(GeneratedArtifact {
        path: dest,
        bytes: xml.len() as u64,
        sources: vec![],
        variant: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn renders_three_routes_with_generation_date() {
        let xml = render_sitemap("https://vidaverde.org", date());

        assert_eq!(xml.matches("<url>").count(), 3);
        assert_eq!(xml.matches("<lastmod>2025-03-14</lastmod>").count(), 3);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset"));
        assert!(xml.ends_with("</urlset>"));
    }

    #[test]
    fn renders_route_details_in_order() {
        let xml = render_sitemap("https://vidaverde.org", date());

        let home = xml.find("<loc>https://vidaverde.org/</loc>").unwrap();
        let projetos = xml.find("<loc>https://vidaverde.org/projetos</loc>").unwrap();
        let cadastro = xml.find("<loc>https://vidaverde.org/cadastro</loc>").unwrap();
        assert!(home < projetos && projetos < cadastro);

        assert!(xml.contains("<changefreq>monthly</changefreq>\n        <priority>0.7</priority>"));
        assert_eq!(xml.matches("<changefreq>weekly</changefreq>").count(), 2);
        assert!(xml.contains("<priority>1.0</priority>"));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let with_slash = render_sitemap("https://example.org/", date());
        let without = render_sitemap("https://example.org", date());
        assert_eq!(with_slash, without);
        assert!(with_slash.contains("<loc>https://example.org/projetos</loc>"));
    }

    #[test]
    fn generate_sitemap_writes_document() {
        let tmp = TempDir::new().unwrap();
        let config = crate::config::BuildConfig::default()
            .with_roots(None, Some(tmp.path().join("dist")));

        let artifact = generate_sitemap(&config, date()).unwrap();

        assert_eq!(artifact.path, tmp.path().join("dist/sitemap.xml"));
        let written = fs::read_to_string(&artifact.path).unwrap();
        assert_eq!(written, render_sitemap("https://vidaverde.org", date()));
        assert_eq!(written.len() as u64, artifact.bytes);
    }
}
