use std::io::BufRead;

use colored::Colorize;
use zeroize::Zeroizing;

use super::{open_store, PasswordArgs};
use crate::auth::mock::{MockAuth, OtpPurpose, PendingOtp, SignupForm};
use crate::auth::{AuthProvider, Credentials};
use crate::db::Store;
use crate::error::{Result, TentlyError};
use crate::settings::load_settings;

fn provider(store: &Store) -> MockAuth<'_> {
    MockAuth::new(store).with_latency_ms(load_settings().mock_latency_ms)
}

fn read_password(args: &PasswordArgs, prompt: &str) -> Result<Zeroizing<String>> {
    if args.password_stdin {
        let mut line = Zeroizing::new(String::new());
        std::io::stdin().lock().read_line(&mut line)?;
        let trimmed = Zeroizing::new(line.trim_end_matches(['\r', '\n']).to_string());
        return Ok(trimmed);
    }
    Ok(Zeroizing::new(rpassword::prompt_password(prompt)?))
}

fn new_password(args: &PasswordArgs) -> Result<(Zeroizing<String>, Zeroizing<String>)> {
    if args.password_stdin {
        let password = read_password(args, "")?;
        let confirm = password.clone();
        return Ok((password, confirm));
    }
    let password = read_password(args, "Password: ")?;
    let confirm = read_password(args, "Confirm password: ")?;
    Ok((password, confirm))
}

fn announce(otp: &PendingOtp) {
    let what = match otp.purpose {
        OtpPurpose::Signup => "Verification",
        OtpPurpose::Reset => "Password reset",
    };
    println!("{what} code for {}: {}", otp.email, otp.code.bold());
    println!("{}", "(Email delivery is simulated; the code is valid for 10 minutes.)".dimmed());
}

pub fn signup(first_name: &str, last_name: &str, email: &str, password: &PasswordArgs) -> Result<()> {
    let (password, confirm) = new_password(password)?;
    if password != confirm {
        return Err(TentlyError::Other("Passwords do not match".into()));
    }
    let store = open_store()?;
    let otp = provider(&store).signup(&SignupForm {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        password,
    })?;
    announce(&otp);
    println!("Run `tently verify-otp CODE` to finish signing up.");
    Ok(())
}

pub fn verify_otp(code: &str) -> Result<()> {
    let store = open_store()?;
    let otp = provider(&store).verify_otp(code)?;
    match otp.purpose {
        OtpPurpose::Signup => println!("Email verified. Signed in as {}.", otp.email),
        OtpPurpose::Reset => {
            println!("Code accepted. Run `tently reset-password --code {}`.", otp.code)
        }
    }
    Ok(())
}

pub fn login(email: &str, password: &PasswordArgs) -> Result<()> {
    let password = read_password(password, "Password: ")?;
    let store = open_store()?;
    let user = provider(&store).login(Credentials::Password {
        email: email.to_string(),
        password,
    })?;
    println!("Signed in as {}.", user.email);
    Ok(())
}

pub fn logout() -> Result<()> {
    let store = open_store()?;
    provider(&store).logout()?;
    println!("Signed out.");
    Ok(())
}

pub fn whoami() -> Result<()> {
    let store = open_store()?;
    match MockAuth::new(&store).current_user()? {
        Some(user) => match &user.name {
            Some(name) => println!("{name} <{}>", user.email),
            None => println!("{}", user.email),
        },
        None => return Err(TentlyError::NotAuthenticated),
    }
    Ok(())
}

pub fn forgot_password(email: &str) -> Result<()> {
    let store = open_store()?;
    let otp = provider(&store).request_password_reset(email)?;
    announce(&otp);
    Ok(())
}

pub fn reset_password(code: &str, password: &PasswordArgs) -> Result<()> {
    let (password, confirm) = new_password(password)?;
    let store = open_store()?;
    provider(&store).reset_password(code, &password, &confirm)?;
    println!("Password changed. Run `tently login` to sign in.");
    Ok(())
}
