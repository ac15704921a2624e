use colored::Colorize;
use coursesync::commands::{CourseOutline, IntegrityReport};
use coursesync::model::{Course, StoredFile};
use coursesync::rpc::FunctionDescriptor;
use coursesync::visibility::Visibility;

pub(super) fn print_course_created(course: &Course) {
    println!(
        "{} {} {}",
        "Created course".green(),
        course.id.to_string().yellow(),
        course.name.bold()
    );
}

pub(super) fn print_outline(outline: &CourseOutline) {
    println!(
        "{} {}",
        outline.course.id.to_string().yellow(),
        outline.course.name.bold()
    );
    for entry in &outline.sections {
        let section = &entry.section;
        let label = section
            .name
            .clone()
            .unwrap_or_else(|| format!("Section {}", section.ordinal));
        println!(
            "\n  {} {} {}",
            format!("{}.", section.ordinal).yellow(),
            label.bold(),
            format!("(section {})", section.id).dimmed()
        );
        if entry.elements.is_empty() {
            println!("     {}", "empty".dimmed());
        }
        for item in &entry.elements {
            let element = &item.element;
            let name = if item.listed {
                element.name.normal()
            } else {
                element.name.dimmed()
            };
            println!(
                "     {:>3} {:<40} {:<14} {}",
                element.position,
                name,
                element.kind().as_str().cyan(),
                visibility_label(&element.visibility).dimmed()
            );
            if let Some(condition) = &item.availability {
                println!("         {} {}", "availability".dimmed(), condition);
            }
        }
    }
}

fn visibility_label(visibility: &Visibility) -> String {
    match visibility {
        Visibility::Always => "visible".to_string(),
        Visibility::Hidden => "hidden".to_string(),
        Visibility::From {
            at,
            show_when_unmet: true,
        } => format!("from {} (shown)", at.format("%Y-%m-%d %H:%M")),
        Visibility::From { at, .. } => format!("from {}", at.format("%Y-%m-%d %H:%M")),
    }
}

pub(super) fn print_staged(draft: &str, files: &[StoredFile]) {
    for file in files {
        println!(
            "{} {} {}",
            format!("draft {}", draft).dimmed(),
            file.path,
            format!("({} bytes)", file.size).dimmed()
        );
    }
}

pub(super) fn print_functions(functions: &[FunctionDescriptor]) {
    for f in functions {
        println!(
            "{:<28} {:<14} {}",
            f.name.bold(),
            f.capability.as_str().cyan(),
            f.description
        );
        println!("{:<28} {}", "", f.params.join(", ").dimmed());
    }
}

pub(super) fn print_report(report: &IntegrityReport) {
    println!(
        "{}",
        format!(
            "{} course(s), {} section(s), {} element(s)",
            report.courses, report.sections, report.elements
        )
        .dimmed()
    );
    if report.is_clean() {
        println!("{}", "No inconsistencies found.".green());
        return;
    }
    println!("{}", "Inconsistencies found:".yellow());
    for problem in &report.problems {
        println!("  - {}", problem.red());
    }
}
