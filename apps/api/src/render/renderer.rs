//! Builds the document tree for a resume.
//!
//! Fields are rendered per item in schema order, grouped by type: dates go to
//! a single right-aligned slot, text fields become title lines, textareas
//! become a paragraph or a list, and links are collected into a trailing row.
//! Empty values render nothing.

use tracing::debug;

use crate::errors::ResumeError;
use crate::render::node::DocumentNode;
use crate::resume::models::{present, Item, PersonalDetails, Resume, Section};
use crate::schema::{FieldType, SchemaRegistry, SectionSchema};

pub const SUMMARY_HEADING: &str = "Professional Summary";
pub const DATE_SEPARATOR: &str = " - ";

/// Leading characters already treated as a bullet.
const BULLETS: [char; 5] = ['-', '•', '●', '∙', '◦'];

/// Renders the `<main>` element: the optional summary followed by one
/// `<section>` per resume section in the resume's own order.
pub fn render(resume: &Resume, registry: &SchemaRegistry) -> Result<DocumentNode, ResumeError> {
    let mut main = DocumentNode::new("main");

    if let Some(summary) = present(&resume.personal.summary) {
        main = main.child(
            DocumentNode::new("section")
                .child(DocumentNode::new("h2").text(SUMMARY_HEADING))
                .child(DocumentNode::new("p").text(summary)),
        );
    }

    for section in resume.ordered_sections() {
        let schema = registry.get(section.schema_id)?;
        main = main.child(render_section(section, schema));
    }

    debug!("Rendered resume {} ({} sections)", resume.id, resume.sections.len());
    Ok(main)
}

/// Renders the `<header>`: name and a contact `<nav>`.
pub fn render_header(personal: &PersonalDetails) -> DocumentNode {
    let mut nav = DocumentNode::new("nav");

    let email = personal.email.trim();
    if !email.is_empty() {
        nav = nav.child(
            DocumentNode::new("a")
                .attr("href", format!("mailto:{email}"))
                .text(email),
        );
    }
    for value in [&personal.phone, &personal.location] {
        if let Some(value) = present(value) {
            nav = nav.child(DocumentNode::new("span").text(value));
        }
    }
    for (value, label) in [
        (&personal.github, "GitHub"),
        (&personal.linkedin, "LinkedIn"),
        (&personal.portfolio, "Portfolio"),
    ] {
        if let Some(href) = present(value) {
            nav = nav.child(external_link(href, label));
        }
    }

    DocumentNode::new("header")
        .child(DocumentNode::new("h1").text(personal.full_name.trim()))
        .child(nav)
}

pub fn render_section(section: &Section, schema: &SectionSchema) -> DocumentNode {
    let mut node = DocumentNode::new("section").child(DocumentNode::new("h2").text(&section.title));

    let items = section.ordered_items();
    if !items.is_empty() {
        node = node.child(
            DocumentNode::new("div").children(items.into_iter().map(|item| render_item(item, schema))),
        );
    }
    node
}

pub fn render_item(item: &Item, schema: &SectionSchema) -> DocumentNode {
    let mut dates = Vec::new();
    let mut titles = Vec::new();
    let mut descriptions = Vec::new();
    let mut links = Vec::new();

    for field in schema.ordered_fields() {
        let value = item.value(field.id).trim();
        if value.is_empty() {
            continue;
        }
        match field.field_type {
            FieldType::Date => dates.push(value),
            FieldType::Text => titles.push(DocumentNode::new("p").class("title").text(value)),
            FieldType::Textarea => descriptions.extend(render_textarea(value)),
            FieldType::Link => links.push(external_link(value, &field.label)),
        }
    }

    let mut node = DocumentNode::new("div").class("section-item");
    if !dates.is_empty() {
        node = node.child(
            DocumentNode::new("div")
                .class("date-container")
                .text(dates.join(DATE_SEPARATOR)),
        );
    }
    node = node.children(titles).children(descriptions);
    if !links.is_empty() {
        node = node.child(DocumentNode::new("div").class("project-links").children(links));
    }
    node
}

/// One non-empty line becomes a paragraph with a bullet prepended unless it
/// already starts with one. Several lines become a list with their own
/// bullets stripped.
pub fn render_textarea(value: &str) -> Option<DocumentNode> {
    let lines: Vec<&str> = value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let body = match lines.as_slice() {
        [] => return None,
        [line] if line.starts_with(&BULLETS[..]) => DocumentNode::new("p").text(*line),
        [line] => DocumentNode::new("p").text(format!("• {line}")),
        lines => DocumentNode::new("ul").children(
            lines
                .iter()
                .map(|line| DocumentNode::new("li").text(strip_bullet(line))),
        ),
    };
    Some(DocumentNode::new("div").class("description").child(body))
}

fn strip_bullet(line: &str) -> &str {
    line.strip_prefix(&BULLETS[..])
        .map(str::trim_start)
        .unwrap_or(line)
}

fn external_link(href: &str, label: &str) -> DocumentNode {
    DocumentNode::new("a")
        .attr("href", href)
        .attr("target", "_blank")
        .attr("rel", "noopener noreferrer")
        .text(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::aggregate::{move_section, set_field_value};
    use crate::schema::catalog::{EXPERIENCE, PROJECTS, SKILLS};
    use crate::test_support::{catalog_resume, field_id, section_id};

    fn texts(nodes: &[&DocumentNode]) -> Vec<String> {
        nodes.iter().map(|n| n.text_content()).collect()
    }

    fn with_value(key: &str, name: &str, value: &str) -> DocumentNode {
        let (registry, resume) = catalog_resume();
        let section = section_id(&resume, &registry, key);
        let item = resume.section(section).unwrap().items[0].id;
        let field = field_id(&registry, key, name);
        let resume = set_field_value(&resume, &registry, section, item, field, value).unwrap();

        let schema = registry.by_key(key).unwrap();
        render_item(&resume.section(section).unwrap().items[0], schema)
    }

    #[test]
    fn test_multi_line_textarea_renders_list() {
        let node = render_textarea("Led team of 5\nShipped v2").unwrap();
        let items = node.find_by_tag("li");
        assert_eq!(texts(&items), vec!["Led team of 5", "Shipped v2"]);
        assert!(node.find_by_tag("p").is_empty());
    }

    #[test]
    fn test_single_line_textarea_gets_bullet() {
        let node = render_textarea("Led team of 5").unwrap();
        assert_eq!(texts(&node.find_by_tag("p")), vec!["• Led team of 5"]);
        assert!(node.has_class("description"));
    }

    #[test]
    fn test_existing_bullet_is_not_doubled() {
        let node = render_textarea("- Led team of 5").unwrap();
        assert_eq!(texts(&node.find_by_tag("p")), vec!["- Led team of 5"]);

        let node = render_textarea("◦ Mentored interns").unwrap();
        assert_eq!(texts(&node.find_by_tag("p")), vec!["◦ Mentored interns"]);
    }

    #[test]
    fn test_list_items_lose_their_bullets() {
        let node = render_textarea("• Led team of 5\n\n  - Shipped v2  \n●Cut costs").unwrap();
        assert_eq!(
            texts(&node.find_by_tag("li")),
            vec!["Led team of 5", "Shipped v2", "Cut costs"]
        );
    }

    #[test]
    fn test_blank_textarea_renders_nothing() {
        assert!(render_textarea(" \n \n").is_none());
    }

    #[test]
    fn test_dates_share_one_slot() {
        let (registry, resume) = catalog_resume();
        let section = section_id(&resume, &registry, EXPERIENCE);
        let item = resume.section(section).unwrap().items[0].id;
        let start = field_id(&registry, EXPERIENCE, "startDate");
        let end = field_id(&registry, EXPERIENCE, "endDate");
        let resume = set_field_value(&resume, &registry, section, item, start, "March 2021").unwrap();
        let resume = set_field_value(&resume, &registry, section, item, end, "Present").unwrap();

        let schema = registry.by_key(EXPERIENCE).unwrap();
        let node = render_item(&resume.section(section).unwrap().items[0], schema);
        let dates = node.find_by_class("date-container");
        assert_eq!(texts(&dates), vec!["March 2021 - Present"]);
        // Date slot comes first, ahead of the title lines.
        assert!(node.elements().next().unwrap().has_class("date-container"));
        assert_eq!(
            texts(&node.find_by_class("title")),
            vec!["Sample Company", "Sample Position"]
        );
    }

    #[test]
    fn test_links_are_labelled_and_trail_the_item() {
        let node = with_value(PROJECTS, "repository", "https://github.com/ada/engine");
        let row = node.elements().last().unwrap();
        assert!(row.has_class("project-links"));
        let anchors = row.find_by_tag("a");
        assert_eq!(texts(&anchors), vec!["Repository Link"]);
        assert_eq!(anchors[0].attribute("href"), Some("https://github.com/ada/engine"));
    }

    #[test]
    fn test_empty_values_render_nothing() {
        let (registry, resume) = catalog_resume();
        let section = section_id(&resume, &registry, SKILLS);
        let schema = registry.by_key(SKILLS).unwrap();
        let node = render_item(&resume.section(section).unwrap().items[0], schema);
        assert_eq!(node.elements().count(), 1);
        assert!(node.find_by_class("date-container").is_empty());
        assert!(node.find_by_class("project-links").is_empty());
    }

    #[test]
    fn test_summary_section_precedes_schema_sections() {
        let (registry, mut resume) = catalog_resume();
        resume.personal.summary = Some("Engineer of engines".to_string());

        let main = render(&resume, &registry).unwrap();
        let sections: Vec<&DocumentNode> = main.elements().collect();
        assert_eq!(sections.len(), resume.sections.len() + 1);
        assert_eq!(sections[0].find_by_tag("h2")[0].text_content(), SUMMARY_HEADING);
        assert_eq!(sections[0].find_by_tag("p")[0].text_content(), "Engineer of engines");
    }

    #[test]
    fn test_blank_summary_is_omitted() {
        let (registry, mut resume) = catalog_resume();
        resume.personal.summary = Some("   ".to_string());
        let main = render(&resume, &registry).unwrap();
        assert_eq!(main.elements().count(), resume.sections.len());
    }

    #[test]
    fn test_sections_follow_resume_order() {
        let (registry, resume) = catalog_resume();
        let skills = section_id(&resume, &registry, SKILLS);
        let resume = move_section(&resume, skills, 0).unwrap();

        let main = render(&resume, &registry).unwrap();
        let headings = texts(&main.find_by_tag("h2"));
        assert_eq!(headings[0], "Skills");
        assert_eq!(headings[1], "Education");
    }

    #[test]
    fn test_header_nav_links() {
        let (_, mut resume) = catalog_resume();
        resume.personal.phone = Some("+44 20 7946 0000".to_string());
        resume.personal.github = Some("https://github.com/ada".to_string());
        resume.personal.linkedin = Some(String::new());

        let header = render_header(&resume.personal);
        assert_eq!(header.find_by_tag("h1")[0].text_content(), "Ada Lovelace");
        let nav = header.find_by_tag("nav")[0];
        let contacts = texts(&nav.elements().collect::<Vec<_>>());
        assert_eq!(contacts, vec!["ada@example.com", "+44 20 7946 0000", "GitHub"]);
        assert_eq!(
            nav.find_by_tag("a")[0].attribute("href"),
            Some("mailto:ada@example.com")
        );
    }

    #[test]
    fn test_unknown_schema_is_an_error() {
        let (_, resume) = catalog_resume();
        let other = SchemaRegistry::with_catalog();
        assert!(render(&resume, &other).is_err());
    }
}
