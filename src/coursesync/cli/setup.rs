use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "coursesync", bin_name = "coursesync", version)]
#[command(about = "Course structure operations: sections, links, files, folders and moves", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to coursesync.toml in the data directory)
    #[arg(long, global = true, help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Data directory holding structure.json and uploaded files
    #[arg(long, global = true, help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create and inspect courses
    #[command(subcommand, display_order = 1)]
    Course(CourseCommands),

    /// Stage files into an upload area
    #[command(subcommand, display_order = 2)]
    Draft(DraftCommands),

    /// Call one remote function with key=value parameters
    #[command(display_order = 3)]
    Call {
        /// Function name (see `coursesync functions`)
        function: String,

        /// Parameters as key=value
        #[arg(num_args = 0..)]
        params: Vec<String>,

        /// Principal to call as
        #[arg(long = "as", value_name = "PRINCIPAL")]
        principal: String,
    },

    /// Serve line-delimited JSON requests on stdin
    #[command(display_order = 4)]
    Serve {
        /// Principal for requests that name none
        #[arg(long = "as", value_name = "PRINCIPAL")]
        principal: Option<String>,
    },

    /// List callable functions
    #[command(display_order = 5)]
    Functions,

    /// Verify structural invariants
    #[command(display_order = 6)]
    Doctor,
}

#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    /// Create a course with an empty general section
    Create {
        /// Course name words (joined with spaces)
        #[arg(required = true, trailing_var_arg = true)]
        name: Vec<String>,
    },

    /// Show a course outline
    Show { id: String },
}

#[derive(Subcommand, Debug)]
pub enum DraftCommands {
    /// Copy local files into an upload area
    Add {
        /// Upload reference to stage into
        draft: String,

        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_collects_params_and_principal() {
        let cli = Cli::try_parse_from([
            "coursesync",
            "call",
            "add_section",
            "course_id=1",
            "section_ordinal=2",
            "--as",
            "bot",
        ])
        .unwrap();
        match cli.command {
            Commands::Call {
                function,
                params,
                principal,
            } => {
                assert_eq!(function, "add_section");
                assert_eq!(params, vec!["course_id=1", "section_ordinal=2"]);
                assert_eq!(principal, "bot");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn global_options_work_after_subcommand() {
        let cli =
            Cli::try_parse_from(["coursesync", "doctor", "--data-dir", "/tmp/x", "-v"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(cli.verbose);
    }

    #[test]
    fn course_create_joins_name_words() {
        let cli = Cli::try_parse_from(["coursesync", "course", "create", "Linear", "Algebra"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Course(CourseCommands::Create { ref name }) if name.join(" ") == "Linear Algebra"
        ));
    }

    #[test]
    fn call_requires_a_principal() {
        assert!(Cli::try_parse_from(["coursesync", "call", "move_element"]).is_err());
    }
}
