//! # Coursesync Binary
//!
//! The binary is intentionally thin: the CLI lives in `src/coursesync/cli/`,
//! this file only invokes `cli::run()` and handles process termination.
//!
//! ```text
//! coursesync course create Linear Algebra
//! coursesync draft add 5 syllabus.pdf
//! coursesync call add_file_resource_element course_id=1 section_ordinal=0 \
//!     upload_ref=5 display_name=Syllabus visible=1 --as sync-bot
//! echo '{"function":"move_element","params":{...}}' | coursesync serve --as sync-bot
//! ```
//!
//! Errors are printed as `Error: ...` on stderr with exit code 1.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
