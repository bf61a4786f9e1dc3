use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn tently(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tently").unwrap();
    cmd.env("HOME", home.path());
    cmd.env("TENTLY_DATA_DIR", home.path().join("data"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn logged_in() -> TempDir {
    let home = TempDir::new().unwrap();
    tently(&home).arg("init").assert().success();
    tently(&home)
        .args(["login", "--email", "grace@coop.ng", "--password-stdin"])
        .write_stdin("hunter2hunter2\n")
        .assert()
        .success()
        .stdout(contains("Signed in as grace@coop.ng"));
    home
}

fn with_demo() -> TempDir {
    let home = logged_in();
    tently(&home)
        .arg("demo")
        .assert()
        .success()
        .stdout(contains("Demo data loaded!"));
    home
}

#[test]
fn status_before_init_points_at_init() {
    let home = TempDir::new().unwrap();
    tently(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Database not found"));
}

#[test]
fn init_then_status_counts_nothing() {
    let home = TempDir::new().unwrap();
    tently(&home).arg("init").assert().success().stdout(contains("Database:"));
    tently(&home)
        .assert()
        .success()
        .stdout(contains("Signed in:  (no)"))
        .stdout(contains("Members:        0"));
}

#[test]
fn lists_require_login() {
    let home = TempDir::new().unwrap();
    tently(&home).arg("init").assert().success();
    tently(&home)
        .args(["members", "list"])
        .assert()
        .failure()
        .stderr(contains("Not logged in"));
}

#[test]
fn logout_closes_the_session() {
    let home = logged_in();
    tently(&home).arg("whoami").assert().success().stdout(contains("grace@coop.ng"));
    tently(&home).arg("logout").assert().success();
    tently(&home).arg("whoami").assert().failure().stderr(contains("Not logged in"));
}

#[test]
fn signup_prints_a_code() {
    let home = TempDir::new().unwrap();
    tently(&home).arg("init").assert().success();
    tently(&home)
        .args([
            "signup",
            "--first-name",
            "Bryan",
            "--last-name",
            "Edwards",
            "--email",
            "bryan@coop.ng",
            "--password-stdin",
        ])
        .write_stdin("correct-horse\n")
        .assert()
        .success()
        .stdout(contains("Verification code for bryan@coop.ng"));
    tently(&home)
        .args(["verify-otp", "12ab"])
        .assert()
        .failure();
}

#[test]
fn demo_members_and_contributions() {
    let home = with_demo();
    tently(&home)
        .args(["members", "list", "--all", "--sort", "name", "--page-size", "20"])
        .assert()
        .success()
        .stdout(contains("Grace Molero"))
        .stdout(contains("Showing 1-12 of 12"));
    // Only active members by default.
    tently(&home)
        .args(["members", "list", "--search", "ibrahim"])
        .assert()
        .success()
        .stdout(contains("No results found."));
    tently(&home)
        .args(["contributions", "list", "--filter", "monthly"])
        .assert()
        .success()
        .stdout(contains("Monthly Contribution"));
    tently(&home)
        .arg("demo")
        .assert()
        .success()
        .stdout(contains("already on file"));
}

#[test]
fn add_show_and_set_status() {
    let home = logged_in();
    tently(&home)
        .args([
            "members",
            "add",
            "--first-name",
            "Amaka",
            "--last-name",
            "Okafor",
            "--email",
            "amaka@coop.ng",
            "--role",
            "secretary",
        ])
        .assert()
        .success()
        .stdout(contains("Added member-"))
        .stdout(contains("Secretary"));
    tently(&home)
        .args(["members", "add", "--first-name", "No", "--email", "bad"])
        .assert()
        .failure()
        .stderr(contains("LastName is required"));
    tently(&home)
        .args(["members", "set-status", "--status", "active", "ghost"])
        .assert()
        .failure()
        .stderr(contains("Unknown member: ghost"));
}

#[test]
fn dashboard_shows_overview_and_transactions() {
    let home = with_demo();
    tently(&home)
        .args(["dashboard", "--filter", "deposit"])
        .assert()
        .success()
        .stdout(contains("Overview"))
        .stdout(contains("Total members:        12"))
        .stdout(contains("Recent Transactions"));
    tently(&home)
        .args(["dashboard", "--page-size", "7"])
        .assert()
        .failure()
        .stderr(contains("Invalid page size: 7"));
}

#[test]
fn import_csv_once() {
    let home = logged_in();
    let csv = home.path().join("members.csv");
    std::fs::write(
        &csv,
        "First Name,Last Name,Email,Role\n\
         Grace,Molero,grace@coop.ng,Treasurer\n\
         Bryan,,bryan@coop.ng,Secretary\n",
    )
    .unwrap();
    let path = csv.to_str().unwrap();
    tently(&home)
        .args(["import", path])
        .assert()
        .success()
        .stdout(contains("1 imported, 0 skipped (email already on file), 1 rejected"))
        .stdout(contains("line 3:"));
    tently(&home)
        .args(["import", path])
        .assert()
        .failure()
        .stderr(contains("already been imported"));
}

#[test]
fn invite_prints_share_link() {
    let home = logged_in();
    tently(&home)
        .env("FRONTEND_URL", "http://coop.test/dashboard")
        .args(["members", "invite", "--email", "bryan@coop.ng"])
        .assert()
        .success()
        .stdout(contains("Invite sent to bryan@coop.ng"))
        .stdout(contains("http://coop.test/signup?invite="));
    tently(&home)
        .args(["members", "invite", "--email", "not-an-email"])
        .assert()
        .failure()
        .stderr(contains("Please enter a valid email address"));
}
