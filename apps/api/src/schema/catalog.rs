//! Predefined section catalog shipped with the service.
//!
//! The catalog is plain configuration data. It is instantiated into a
//! `SchemaRegistry` (which assigns ids) and never consulted as global state.

use crate::schema::models::{NewField, NewSectionSchema};

pub const EDUCATION: &str = "education";
pub const EXPERIENCE: &str = "experience";
pub const PROJECTS: &str = "projects";
pub const SKILLS: &str = "skills";
pub const POSITION_OF_RESPONSIBILITY: &str = "position_of_responsibility";
pub const CERTIFICATIONS: &str = "certifications_and_accomplishments";
pub const EXTRA_CURRICULARS: &str = "extra_curriculars";

/// All predefined schemas, in their default resume order.
pub fn predefined_schemas() -> Vec<NewSectionSchema> {
    vec![
        education(),
        experience(),
        projects(),
        skills(),
        position_of_responsibility(),
        certifications(),
        extra_curriculars(),
    ]
}

fn education() -> NewSectionSchema {
    NewSectionSchema::new(
        "Education",
        vec![
            NewField::text("institution", "Institution")
                .required()
                .placeholder("Enter institution name e.g. Harvard University"),
            NewField::text("degree", "Degree/Certificate")
                .required()
                .placeholder("Enter degree name e.g. Bachelor of Science"),
            NewField::date("startDate", "Start Date").placeholder("Select start date"),
            NewField::date("endDate", "End Date").placeholder("Select end date"),
            NewField::text("score", "Score").placeholder("Enter your score e.g. 3.5/4.0 or 85%"),
            NewField::textarea("description", "Description")
                .placeholder("Describe your academic achievements, relevant coursework, etc."),
        ],
    )
    .keyed(EDUCATION)
    .description("Add your educational background")
}

fn experience() -> NewSectionSchema {
    NewSectionSchema::new(
        "Work Experience",
        vec![
            NewField::text("company", "Company")
                .required()
                .placeholder("Enter company name e.g. Google"),
            NewField::text("position", "Position")
                .required()
                .placeholder("Enter position e.g. Software Engineer"),
            NewField::date("startDate", "Start Date").placeholder("Select start date"),
            NewField::date("endDate", "End Date").placeholder("Select end date"),
            NewField::textarea("responsibilities", "Responsibilities")
                .placeholder("Describe your key responsibilities and achievements"),
        ],
    )
    .keyed(EXPERIENCE)
    .description("Add your work experience")
}

fn projects() -> NewSectionSchema {
    NewSectionSchema::new(
        "Projects",
        vec![
            NewField::text("project", "Project")
                .required()
                .placeholder("Enter project name e.g. Portfolio Website"),
            NewField::text("techstack", "Tech Stack or Tools Used").required(),
            NewField::textarea("description", "Description")
                .placeholder("Describe your project in detail"),
            NewField::link("link", "Link").placeholder("Enter project link"),
            NewField::link("repository", "Repository Link")
                .placeholder("Enter project repository link"),
        ],
    )
    .keyed(PROJECTS)
    .description("Add your projects")
}

fn skills() -> NewSectionSchema {
    NewSectionSchema::new(
        "Skills",
        vec![NewField::text("skill", "Skill").required().placeholder(
            "Enter skills on a group basis e.g. Programming Languages, Frameworks, Tools",
        )],
    )
    .keyed(SKILLS)
    .description("Add your skills")
}

fn position_of_responsibility() -> NewSectionSchema {
    NewSectionSchema::new(
        "Positions of Responsibility",
        vec![
            NewField::text("position", "Position")
                .required()
                .placeholder("Enter position e.g. President of Coding Club"),
            NewField::date("startDate", "Start Date").placeholder("Select start date"),
            NewField::date("endDate", "End Date").placeholder("Select end date"),
            NewField::textarea("description", "Description")
                .placeholder("Describe your responsibilities and achievements"),
        ],
    )
    .keyed(POSITION_OF_RESPONSIBILITY)
    .description("Add your positions of responsibility")
}

fn certifications() -> NewSectionSchema {
    NewSectionSchema::new(
        "Certifications & Accomplishments",
        vec![
            NewField::text("title", "Title")
                .required()
                .placeholder("Enter title e.g. AWS Certified Solutions Architect"),
            NewField::date("date", "Date").placeholder("Select date"),
            NewField::textarea("description", "Description")
                .placeholder("Describe your accomplishment or certification"),
        ],
    )
    .keyed(CERTIFICATIONS)
    .description("Add your certifications and accomplishments")
}

fn extra_curriculars() -> NewSectionSchema {
    NewSectionSchema::new(
        "Extra-Curricular Activities",
        vec![NewField::text("activity", "Activity")
            .required()
            .placeholder("Enter activity e.g. Debate Club")],
    )
    .keyed(EXTRA_CURRICULARS)
    .description("Add your extra-curricular activities")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::models::FieldType;

    #[test]
    fn test_catalog_has_seven_keyed_schemas() {
        let keys: Vec<String> = predefined_schemas()
            .into_iter()
            .filter_map(|s| s.key)
            .collect();
        assert_eq!(
            keys,
            vec![
                EDUCATION,
                EXPERIENCE,
                PROJECTS,
                SKILLS,
                POSITION_OF_RESPONSIBILITY,
                CERTIFICATIONS,
                EXTRA_CURRICULARS
            ]
        );
    }

    #[test]
    fn test_projects_carry_two_link_fields() {
        let links = projects()
            .fields
            .iter()
            .filter(|f| f.field_type == FieldType::Link)
            .count();
        assert_eq!(links, 2);
    }

    #[test]
    fn test_every_schema_has_a_required_field() {
        for schema in predefined_schemas() {
            assert!(
                schema.fields.iter().any(|f| f.required),
                "{} has no required field",
                schema.title
            );
        }
    }
}
