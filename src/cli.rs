use std::path::{Path, PathBuf};

use circulation::{
    Approved, AuditEntry, AuditLog, BookId, Config, CsvAudit, Engine, IssueId, JsonStore,
    RequestId, StudentId,
};
use clap::ArgAction;
use tracing::instrument;

const CONFIG_FILE: &str = "config.toml";
const AUDIT_FILE: &str = "logs.csv";

/// Parse a book id from a string, normalizing to uppercase.
///
/// This is a CLI boundary function that accepts lowercase input
/// and normalizes it before parsing.
fn parse_book_id(s: &str) -> Result<BookId, String> {
    s.to_uppercase().parse().map_err(|e| format!("{e}"))
}

fn parse_student_id(s: &str) -> Result<StudentId, String> {
    s.to_uppercase().parse().map_err(|e| format!("{e}"))
}

fn parse_issue_id(s: &str) -> Result<IssueId, String> {
    s.to_uppercase().parse().map_err(|e| format!("{e}"))
}

fn parse_request_id(s: &str) -> Result<RequestId, String> {
    s.to_uppercase().parse().map_err(|e| format!("{e}"))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the circulation data directory
    #[arg(short, long, default_value = "data", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Status(Status::default()))
            .run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show circulation counts (default)
    Status(Status),

    /// Initialize a new circulation data directory
    Init,

    /// Add a book to the catalogue
    AddBook(AddBook),

    /// Edit a book's details or copy counts
    EditBook(EditBook),

    /// Delete a book from the catalogue
    DeleteBook(DeleteBook),

    /// Register a new student account
    Register(Register),

    /// Approve a pending student account
    ApproveStudent(ApproveStudent),

    /// Block a student from further borrowing
    BlockStudent(BlockStudent),

    /// Set or clear a student's late-return flag
    Flag(Flag),

    /// File a request to borrow a book (student action)
    Request(Request),

    /// File a request to return a borrowed book (student action)
    RequestReturn(RequestReturn),

    /// Approve a pending request and carry it out
    Approve(Approve),

    /// Issue a book directly, bypassing the request queue
    Issue(Issue),

    /// Return a book directly, bypassing the request queue
    Return(Return),

    /// List books, students, issues, or requests
    List(List),

    /// Show the audit trail
    Logs(Logs),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Status(command) => command.run(root)?,
            Self::Init => Init::run(&root)?,
            Self::AddBook(command) => command.run(root)?,
            Self::EditBook(command) => command.run(root)?,
            Self::DeleteBook(command) => command.run(root)?,
            Self::Register(command) => command.run(root)?,
            Self::ApproveStudent(command) => command.run(root)?,
            Self::BlockStudent(command) => command.run(root)?,
            Self::Flag(command) => command.run(root)?,
            Self::Request(command) => command.run(root)?,
            Self::RequestReturn(command) => command.run(root)?,
            Self::Approve(command) => command.run(root)?,
            Self::Issue(command) => command.run(root)?,
            Self::Return(command) => command.run(root)?,
            Self::List(command) => command.run(root)?,
            Self::Logs(command) => command.run(&root)?,
        }
        Ok(())
    }
}

/// Reads the directory's config, falling back to defaults when no config
/// file exists yet.
fn load_config(root: &Path) -> anyhow::Result<Config> {
    let path = root.join(CONFIG_FILE);
    if path.exists() {
        Ok(Config::load(&path)?)
    } else {
        tracing::debug!("no {CONFIG_FILE} in {}, using defaults", root.display());
        Ok(Config::default())
    }
}

fn open_engine(root: &Path) -> anyhow::Result<Engine<JsonStore>> {
    let config = load_config(root)?;
    Ok(Engine::new(JsonStore::new(root), config))
}

/// Appends an audit row. Audit failures are reported but never fail the
/// action they describe.
fn audit(root: &Path, user_id: &str, user_role: &str, action: &str, details: String) {
    let entry = AuditEntry::new(user_id, user_role, action, details);
    if let Err(e) = CsvAudit::new(root.join(AUDIT_FILE)).append(&entry) {
        tracing::warn!("failed to append audit entry: {e}");
    }
}

#[derive(Debug, clap::Parser, Default)]
#[command(about = "Show book, student, and loan counts")]
pub struct Status {
    /// Emit the counts as JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl Status {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let engine = open_engine(&root)?;
        let analytics = engine.analytics()?;
        let pending = engine.pending_requests()?.len();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&analytics)?);
            return Ok(());
        }

        println!(
            "Books:    {} copies, {} available, {} issued",
            analytics.total_books, analytics.available_books, analytics.issued_books
        );
        println!(
            "Students: {} registered, {} approved, {} pending, {} flagged",
            analytics.total_students,
            analytics.approved_students,
            analytics.pending_students,
            analytics.flagged_students
        );
        println!("Loans:    {} currently out", analytics.currently_issued);
        println!("Requests: {pending} awaiting approval");
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Init {}

impl Init {
    #[instrument]
    fn run(root: &PathBuf) -> anyhow::Result<()> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            anyhow::bail!(
                "Data directory already initialized (found existing {CONFIG_FILE})"
            );
        }

        std::fs::create_dir_all(root)
            .map_err(|e| anyhow::anyhow!("Failed to create data directory: {e}"))?;
        Config::default().save(&config_path)?;

        println!("Initialized circulation data directory in {}", root.display());
        println!("  Created: {CONFIG_FILE}");
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct AddBook {
    /// Title of the book
    title: String,

    /// Author of the book
    #[clap(long, short)]
    author: String,

    /// Genre to shelve under
    #[clap(long, short)]
    genre: String,

    /// Number of copies the library owns
    #[clap(long, short, default_value_t = 1)]
    copies: u32,
}

impl AddBook {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut engine = open_engine(&root)?;
        let book = engine.add_book(self.title, self.author, self.genre, self.copies)?;
        audit(
            &root,
            "admin",
            "admin",
            "add_book",
            format!("{}: {}", book.id, book.title),
        );
        println!("Book '{}' added successfully with id {}", book.title, book.id);
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct EditBook {
    /// The id of the book to edit
    #[clap(value_parser = parse_book_id)]
    id: BookId,

    /// New title
    #[clap(long)]
    title: Option<String>,

    /// New author
    #[clap(long)]
    author: Option<String>,

    /// New genre
    #[clap(long)]
    genre: Option<String>,

    /// New total copy count
    #[clap(long)]
    total: Option<u32>,

    /// New available copy count
    #[clap(long)]
    available: Option<u32>,
}

impl EditBook {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut engine = open_engine(&root)?;

        // Unspecified fields keep their current values.
        let current = engine.book(&self.id)?;
        let total = self.total.unwrap_or_else(|| current.total_copies());
        let available = self.available.unwrap_or_else(|| current.available_copies());
        let book = engine.update_book(
            &self.id,
            self.title.unwrap_or(current.title),
            self.author.unwrap_or(current.author),
            self.genre.unwrap_or(current.genre),
            total,
            available,
        )?;
        audit(
            &root,
            "admin",
            "admin",
            "edit_book",
            format!("{}: {}", book.id, book.title),
        );
        println!("Book '{}' updated successfully", book.title);
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct DeleteBook {
    /// The id of the book to delete
    #[clap(value_parser = parse_book_id)]
    id: BookId,
}

impl DeleteBook {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut engine = open_engine(&root)?;
        engine.delete_book(&self.id)?;
        audit(&root, "admin", "admin", "delete_book", self.id.to_string());
        println!("Book {} deleted successfully", self.id);
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Register {
    /// Full name of the student
    name: String,

    /// Email address, unique across the membership
    #[clap(long, short)]
    email: String,

    /// Account password
    #[clap(long, short)]
    password: String,
}

impl Register {
    #[instrument(skip(self))]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut engine = open_engine(&root)?;
        let student = engine.register_student(self.name, self.email, &self.password)?;
        audit(
            &root,
            student.id.as_str(),
            "student",
            "register",
            student.email.clone(),
        );
        println!("Registration successful! Please wait for admin approval.");
        println!("Your student id is {}", student.id);
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct ApproveStudent {
    /// The id of the student to approve
    #[clap(value_parser = parse_student_id)]
    id: StudentId,
}

impl ApproveStudent {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut engine = open_engine(&root)?;
        let student = engine.approve_student(&self.id)?;
        audit(
            &root,
            "admin",
            "admin",
            "approve_student",
            student.id.to_string(),
        );
        println!("Student {} approved successfully", student.name);
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct BlockStudent {
    /// The id of the student to block
    #[clap(value_parser = parse_student_id)]
    id: StudentId,
}

impl BlockStudent {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut engine = open_engine(&root)?;
        let student = engine.block_student(&self.id)?;
        audit(
            &root,
            "admin",
            "admin",
            "block_student",
            student.id.to_string(),
        );
        println!("Student {} blocked successfully", student.name);
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Flag {
    /// The id of the student
    #[clap(value_parser = parse_student_id)]
    id: StudentId,

    /// Clear the flag instead of setting it
    #[arg(long)]
    clear: bool,
}

impl Flag {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut engine = open_engine(&root)?;
        let student = engine.set_student_flag(&self.id, !self.clear)?;
        let action = if self.clear { "unflag_student" } else { "flag_student" };
        audit(&root, "admin", "admin", action, student.id.to_string());
        if self.clear {
            println!("Student {} unflagged successfully", student.name);
        } else {
            println!("Student {} flagged successfully", student.name);
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Request {
    /// The id of the requesting student
    #[clap(value_parser = parse_student_id)]
    student: StudentId,

    /// The id of the book to borrow
    #[clap(value_parser = parse_book_id)]
    book: BookId,
}

impl Request {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut engine = open_engine(&root)?;
        let request = engine.request_issue(&self.student, &self.book)?;
        let title = engine.book(&self.book)?.title;
        audit(
            &root,
            self.student.as_str(),
            "student",
            "request_issue",
            format!("{}: {}", request.id, self.book),
        );
        println!(
            "Request to borrow '{title}' submitted successfully. Waiting for admin approval."
        );
        println!("Request id: {}", request.id);
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct RequestReturn {
    /// The id of the borrowing student
    #[clap(value_parser = parse_student_id)]
    student: StudentId,

    /// The id of the ledger entry to close
    #[clap(value_parser = parse_issue_id)]
    issue: IssueId,
}

impl RequestReturn {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut engine = open_engine(&root)?;
        let request = engine.request_return(&self.student, &self.issue)?;
        audit(
            &root,
            self.student.as_str(),
            "student",
            "request_return",
            format!("{}: {}", request.id, self.issue),
        );
        println!("Return request submitted successfully. Waiting for admin approval.");
        println!("Request id: {}", request.id);
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Approve {
    /// The id of the request to approve
    #[clap(value_parser = parse_request_id)]
    request: RequestId,
}

impl Approve {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut engine = open_engine(&root)?;
        match engine.approve_request(&self.request)? {
            Approved::Issued(issue) => {
                let title = engine.book(&issue.book_id)?.title;
                let name = engine.student(&issue.student_id)?.name;
                audit(
                    &root,
                    "admin",
                    "admin",
                    "approve_issue",
                    format!("{}: {} -> {}", self.request, issue.book_id, issue.student_id),
                );
                println!("Book '{title}' issued to {name} successfully");
                println!("Issue id: {}", issue.id);
            }
            Approved::Returned(receipt) => {
                audit(
                    &root,
                    "admin",
                    "admin",
                    "approve_return",
                    format!("{}: {}", self.request, receipt.issue.id),
                );
                println!("{receipt}");
            }
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Issue {
    /// The id of the borrowing student
    #[clap(value_parser = parse_student_id)]
    student: StudentId,

    /// The id of the book to issue
    #[clap(value_parser = parse_book_id)]
    book: BookId,

    /// Loan period in days (defaults to the configured period)
    #[clap(long, short)]
    days: Option<i64>,
}

impl Issue {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut engine = open_engine(&root)?;
        let days = self.days.unwrap_or_else(|| engine.config().loan_period_days());
        let issue = engine.issue_book(&self.student, &self.book, days)?;
        let title = engine.book(&self.book)?.title;
        let name = engine.student(&self.student)?.name;
        audit(
            &root,
            "admin",
            "admin",
            "issue_book",
            format!("{}: {} -> {}", issue.id, self.book, self.student),
        );
        println!("Book '{title}' issued to {name} successfully");
        println!("Issue id: {}", issue.id);
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Return {
    /// The id of the ledger entry to close
    #[clap(value_parser = parse_issue_id)]
    issue: IssueId,
}

impl Return {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut engine = open_engine(&root)?;
        let receipt = engine.return_book(&self.issue)?;
        audit(
            &root,
            "admin",
            "admin",
            "return_book",
            format!("{}: {}", receipt.issue.id, receipt.issue.book_id),
        );
        println!("{receipt}");
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct List {
    /// Which collection to list
    #[arg(value_enum)]
    what: Collection,

    /// Emit the collection as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Collection {
    Books,
    Students,
    Issues,
    Requests,
}

impl List {
    #[instrument(level = "debug", skip(self))]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let engine = open_engine(&root)?;
        match self.what {
            Collection::Books => {
                let books = engine.books()?;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&books)?);
                    return Ok(());
                }
                for book in books {
                    println!(
                        "{}  {:<30} {:<20} {}/{} available",
                        book.id,
                        book.title,
                        book.author,
                        book.available_copies(),
                        book.total_copies()
                    );
                }
            }
            Collection::Students => {
                let students = engine.students()?;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&students)?);
                    return Ok(());
                }
                for student in students {
                    let status = if student.approved { "approved" } else { "pending" };
                    let flag = if student.flagged { " [flagged]" } else { "" };
                    println!(
                        "{}  {:<24} {:<28} {status}{flag}",
                        student.id, student.name, student.email
                    );
                }
            }
            Collection::Issues => {
                let issues = engine.issues()?;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&issues)?);
                    return Ok(());
                }
                for issue in issues {
                    let state = if issue.returned {
                        "returned"
                    } else if issue.return_requested {
                        "return requested"
                    } else {
                        "out"
                    };
                    let due = issue
                        .effective_due_date()
                        .map_or_else(|| "no due date".to_string(), |d| d.format("%Y-%m-%d").to_string());
                    println!(
                        "{}  {} borrowed {} (due {due}) - {state}",
                        issue.id, issue.student_id, issue.book_id
                    );
                }
            }
            Collection::Requests => {
                let requests = engine.requests()?;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&requests)?);
                    return Ok(());
                }
                for request in requests {
                    let status = if request.is_pending() { "pending" } else { "approved" };
                    println!(
                        "{}  {:?} {} by {} - {status}",
                        request.id, request.kind, request.book_id, request.student_id
                    );
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Logs {
    /// Show only the last N entries
    #[clap(long, short)]
    limit: Option<usize>,
}

impl Logs {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let entries = CsvAudit::new(root.join(AUDIT_FILE)).tail(self.limit)?;
        if entries.is_empty() {
            println!("No audit entries yet.");
            return Ok(());
        }
        for entry in entries {
            println!(
                "{}  {:<12} {:<8} {:<16} {}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.user_id,
                entry.user_role,
                entry.action,
                entry.details
            );
        }
        Ok(())
    }
}
