//! Extractors scoped to presentation sections.
//!
//! Every extractor here returns exactly one entry per section found under the
//! section selector, so the lists line up index by index. A section missing
//! the field gets a placeholder (or `None`) rather than being dropped.

use std::time::Duration;

use tracing::debug;

use super::datetime::parse_presentation_time;
use crate::domain::placeholders::{NO_PRESENTATIONS, NO_TITLE};
use crate::domain::{DisplayLink, ExtractionResult, PresentationTime};
use crate::infrastructure::dom::{DomAccessor, NodeHandle};
use crate::infrastructure::parsing_error::ExtractionOutcome;

async fn section_handles<A: DomAccessor>(
    accessor: &mut A,
    section_selector: &str,
    timeout: Duration,
) -> ExtractionOutcome<Vec<NodeHandle>> {
    accessor.wait_present_all(section_selector, timeout).await
}

/// Non-empty texts of `selector` inside one section. Lookup failures read as empty.
async fn scoped_texts<A: DomAccessor>(
    accessor: &mut A,
    section: &NodeHandle,
    selector: &str,
) -> Vec<String> {
    let nodes = match accessor.find_all(Some(section), selector).await {
        Ok(nodes) => nodes,
        Err(e) => {
            debug!("Scoped lookup '{}' failed: {}", selector, e);
            return Vec::new();
        }
    };
    let mut texts = Vec::with_capacity(nodes.len());
    for node in &nodes {
        if let Ok(text) = accessor.text(node).await {
            if !text.is_empty() {
                texts.push(text);
            }
        }
    }
    texts
}

/// Number of presentation sections in the open session.
pub async fn count_sections<A: DomAccessor>(
    accessor: &mut A,
    section_selector: &str,
    timeout: Duration,
) -> ExtractionResult<usize> {
    match section_handles(accessor, section_selector, timeout).await {
        Ok(sections) => ExtractionResult::success(format!("{} sections", sections.len()), sections.len()),
        Err(e) => {
            debug!("{}: {}", NO_PRESENTATIONS, e);
            ExtractionResult::failure(NO_PRESENTATIONS, 0)
        }
    }
}

/// First title per section, `No title found` where a section has none.
pub async fn extract_section_titles<A: DomAccessor>(
    accessor: &mut A,
    section_selector: &str,
    title_selector: &str,
    timeout: Duration,
) -> ExtractionResult<Vec<String>> {
    let sections = match section_handles(accessor, section_selector, timeout).await {
        Ok(sections) => sections,
        Err(e) => return ExtractionResult::from_error(&e, Vec::new()),
    };

    let mut titles = Vec::with_capacity(sections.len());
    for section in &sections {
        let title = scoped_texts(accessor, section, title_selector)
            .await
            .into_iter()
            .next()
            .unwrap_or_else(|| NO_TITLE.to_string());
        titles.push(title);
    }
    ExtractionResult::success(format!("{} titles", titles.len()), titles)
}

/// All texts per section joined with `"; "`, `placeholder` where a section has none.
pub async fn extract_section_texts<A: DomAccessor>(
    accessor: &mut A,
    section_selector: &str,
    field_selector: &str,
    timeout: Duration,
    placeholder: &str,
) -> ExtractionResult<Vec<String>> {
    let sections = match section_handles(accessor, section_selector, timeout).await {
        Ok(sections) => sections,
        Err(e) => return ExtractionResult::from_error(&e, Vec::new()),
    };

    let mut values = Vec::with_capacity(sections.len());
    for section in &sections {
        let texts = scoped_texts(accessor, section, field_selector).await;
        values.push(if texts.is_empty() {
            placeholder.to_string()
        } else {
            texts.join("; ")
        });
    }
    ExtractionResult::success(format!("{} sections read", values.len()), values)
}

/// Presentation time per section; `None` where the section shows no time element.
pub async fn extract_section_times<A: DomAccessor>(
    accessor: &mut A,
    section_selector: &str,
    time_selector: &str,
    timeout: Duration,
) -> ExtractionResult<Vec<Option<PresentationTime>>> {
    let sections = match section_handles(accessor, section_selector, timeout).await {
        Ok(sections) => sections,
        Err(e) => return ExtractionResult::from_error(&e, Vec::new()),
    };

    let mut times = Vec::with_capacity(sections.len());
    for section in &sections {
        let text = scoped_texts(accessor, section, time_selector).await.into_iter().next();
        let time = match text {
            Some(text) => match parse_presentation_time(&text) {
                Ok(time) => Some(time),
                Err(e) => return ExtractionResult::from_error(&e, Vec::new()),
            },
            None => None,
        };
        times.push(time);
    }
    ExtractionResult::success(format!("{} times", times.len()), times)
}

/// First link per section as a display link (href + text).
pub async fn extract_section_links<A: DomAccessor>(
    accessor: &mut A,
    section_selector: &str,
    link_selector: &str,
    timeout: Duration,
) -> ExtractionResult<Vec<Option<DisplayLink>>> {
    let sections = match section_handles(accessor, section_selector, timeout).await {
        Ok(sections) => sections,
        Err(e) => return ExtractionResult::from_error(&e, Vec::new()),
    };

    let mut links = Vec::with_capacity(sections.len());
    for section in &sections {
        links.push(first_link(accessor, section, link_selector).await);
    }
    let found = links.iter().flatten().count();
    if found == 0 {
        return ExtractionResult::success(NO_PRESENTATIONS, links);
    }
    ExtractionResult::success(format!("{found} links"), links)
}

async fn first_link<A: DomAccessor>(
    accessor: &mut A,
    section: &NodeHandle,
    link_selector: &str,
) -> Option<DisplayLink> {
    let nodes = accessor.find_all(Some(section), link_selector).await.ok()?;
    for node in &nodes {
        let Ok(Some(href)) = accessor.attribute(node, "href").await else {
            continue;
        };
        let text = accessor.text(node).await.unwrap_or_default();
        return Some(DisplayLink::new(href, text));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::placeholders::{NO_AUTHORS, NO_TIME};
    use crate::infrastructure::dom::SnapshotBrowser;

    const SESSION: &str = r#"<html><body>
        <div id="presentation-1">
            <h6 class="my-2">Osimertinib after chemoradiation</h6>
            <h5 class="text-14">S. Lu</h5><h5 class="text-14">T. Kato</h5>
            <p class="text-12">Shanghai Chest Hospital</p>
            <div class="presentation-time">1:00 PM – 1:12 PM CDT</div>
            <a href="/abstract/1">LBA4</a>
        </div>
        <div id="presentation-2">
            <h6 class="my-2">Discussion</h6>
            <div class="presentation-time">TBA</div>
        </div>
        <div id="presentation-3"></div>
    </body></html>"#;

    const SECTION: &str = "div[id*='presentation']";
    const WAIT: Duration = Duration::from_secs(20);

    fn browser() -> SnapshotBrowser {
        SnapshotBrowser::new("https://program.test/s/9").with_page("https://program.test/s/9", SESSION)
    }

    #[tokio::test]
    async fn one_entry_per_section_with_placeholders() {
        let mut browser = browser();

        let titles = extract_section_titles(&mut browser, SECTION, "h6.my-2", WAIT).await;
        assert_eq!(
            titles.data,
            vec!["Osimertinib after chemoradiation", "Discussion", NO_TITLE]
        );

        let authors =
            extract_section_texts(&mut browser, SECTION, "h5.text-14", WAIT, NO_AUTHORS).await;
        assert_eq!(authors.data, vec!["S. Lu; T. Kato", NO_AUTHORS, NO_AUTHORS]);

        assert_eq!(count_sections(&mut browser, SECTION, WAIT).await.data, 3);
    }

    #[tokio::test]
    async fn times_and_links_align_with_sections() {
        let mut browser = browser();

        let times = extract_section_times(&mut browser, SECTION, "div.presentation-time", WAIT).await;
        assert_eq!(times.data.len(), 3);
        assert_eq!(times.data[0].as_ref().unwrap().time, "1:00 PM - 1:12 PM");
        assert_eq!(times.data[1].as_ref().unwrap().time, NO_TIME);
        assert!(times.data[2].is_none());

        let links = extract_section_links(&mut browser, SECTION, "a[href]", WAIT).await;
        assert_eq!(
            links.data,
            vec![Some(DisplayLink::new("/abstract/1", "LBA4")), None, None]
        );
    }

    #[tokio::test]
    async fn session_without_sections() {
        let mut browser = SnapshotBrowser::new("https://program.test/empty")
            .with_page("https://program.test/empty", "<html><body></body></html>");

        let count = count_sections(&mut browser, SECTION, WAIT).await;
        assert!(!count.status);
        assert_eq!(count.message, NO_PRESENTATIONS);
        assert_eq!(count.data, 0);

        let titles = extract_section_titles(&mut browser, SECTION, "h6", WAIT).await;
        assert!(!titles.status);
        assert!(titles.data.is_empty());
    }
}
