//! Command handlers. Each one drives the session model and prints a
//! human-readable report.

use std::io::Write;

use anyhow::{Context, Result};

use crate::models::{
    AccountType, ApplicationForm, CvFile, NewAccount, NewOpportunity, Opportunity, User,
};
use crate::session::{SearchOutcome, SearchQuery, Session};

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

async fn login_interactive(session: &Session) -> Result<Option<User>> {
    let email = prompt("Email")?;
    let password = prompt("Password")?;
    session.verify_login(&email, &password).await
}

pub async fn cmd_featured(session: &Session) -> Result<()> {
    let featured = session.fetch_featured().await?;

    if featured.is_empty() {
        println!("No featured opportunities right now.");
        return Ok(());
    }

    println!("Featured Opportunities ({} total)", featured.len());
    println!("{:-<70}", "");

    for opportunity in &featured {
        print_summary_line(opportunity);
    }

    Ok(())
}

pub async fn cmd_search(
    session: &Session,
    keyword: &[String],
    location: Option<String>,
    field: Option<String>,
    opportunity_type: Option<String>,
    page: usize,
) -> Result<()> {
    let keyword = keyword.join(" ");
    let query = SearchQuery {
        location,
        title_or_keyword: if keyword.is_empty() {
            None
        } else {
            Some(keyword)
        },
        field_of_study: field,
        opportunity_type,
    };

    let total = match session.load_search_results(query).await? {
        SearchOutcome::Updated(count) => count,
        SearchOutcome::Superseded => return Ok(()),
    };

    if total == 0 {
        println!("No opportunities matched.");
        return Ok(());
    }

    let results = session.search_results_page(page).await;

    println!("Search Results ({total} total, page {page})");
    println!("{:-<70}", "");

    if results.is_empty() {
        println!("(no results on this page)");
        return Ok(());
    }

    for summary in &results {
        println!("• {} [{}]", summary.title, summary.opportunity_type);
        println!(
            "  {} | {} | ID: {}",
            summary.location, summary.deadline, summary.id
        );
    }

    Ok(())
}

pub async fn cmd_show(session: &Session, id: &str) -> Result<()> {
    let Some(opportunity) = session.load_opportunity(id).await? else {
        println!("Opportunity with ID {id} not found.");
        return Ok(());
    };

    println!("{}", opportunity.title);
    println!("{:-<70}", "");
    println!("Company:     {}", opportunity.company);
    println!("Type:        {}", opportunity.opportunity_type);
    println!("Field:       {}", opportunity.field_of_study);
    println!("Location:    {}", opportunity.location);
    println!("Engagement:  {}", opportunity.engagement_type);
    println!("Arrangement: {}", opportunity.work_arrangement);
    println!("Deadline:    {}", opportunity.deadline);
    println!();
    println!("{}", opportunity.description);

    if !opportunity.qualifications.is_empty() {
        println!();
        println!("Your profile:");
        for item in &opportunity.qualifications {
            println!("  - {item}");
        }
    }

    if !opportunity.benefits.is_empty() {
        println!();
        println!("Benefits:");
        for item in &opportunity.benefits {
            println!("  - {item}");
        }
    }

    if !opportunity.tags.is_empty() {
        println!();
        println!("Tags: {}", opportunity.tags.join(", "));
    }

    println!();
    println!(
        "Contact: {} <{}>",
        opportunity.contact_person, opportunity.contact_person_email
    );

    Ok(())
}

pub async fn cmd_signup(session: &Session) -> Result<()> {
    // Email validation needs the domain cache.
    session.preload_university_domains().await?;

    let email = prompt("Email")?;

    if !session.validate_email(&email).await {
        println!("Email domain not recognized. Use a university or company address.");
        return Ok(());
    }

    let name_and_surname = prompt("Name and surname")?;
    let password = prompt("Password")?;

    let user = session
        .upload_account(NewAccount {
            email,
            name_and_surname,
            password,
        })
        .await?;

    println!();
    println!("✓ Account created: {} ({})", user.id, user.account_type);
    Ok(())
}

pub async fn cmd_login(session: &Session) -> Result<()> {
    match login_interactive(session).await? {
        Some(user) => println!("✓ Logged in as {} ({})", user.name, user.account_type),
        None => println!("Invalid email or password."),
    }
    Ok(())
}

pub async fn cmd_post(session: &Session, file: &str) -> Result<()> {
    println!("Log in with your company account first.");

    if login_interactive(session).await?.is_none() {
        println!("Invalid email or password.");
        return Ok(());
    }

    if !session.is_logged_in(Some(AccountType::Company)).await {
        println!("Only company accounts can publish opportunities.");
        return Ok(());
    }

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read opportunity file: {file}"))?;
    let new: NewOpportunity =
        toml::from_str(&content).with_context(|| format!("Failed to parse {file}"))?;

    let opportunity = session.upload_opportunity(new).await?;

    println!();
    println!("✓ Published: {} (ID: {})", opportunity.title, opportunity.id);
    Ok(())
}

pub async fn cmd_apply(session: &Session, opportunity_id: &str, cv: Option<&str>) -> Result<()> {
    println!("Log in to apply.");

    let Some(user) = login_interactive(session).await? else {
        println!("Invalid email or password.");
        return Ok(());
    };

    let Some(opportunity) = session.load_opportunity(opportunity_id).await? else {
        println!("Opportunity with ID {opportunity_id} not found.");
        return Ok(());
    };

    let cv = match cv {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read CV file: {path}"))?;
            let file_name = std::path::Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "cv".to_string());
            let content_type = mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string();

            Some(CvFile {
                file_name,
                content_type,
                bytes,
            })
        }
        None => None,
    };

    let application_id = session
        .submit_application(ApplicationForm {
            user_id: user.id,
            opportunity_id: opportunity.id,
            cv,
        })
        .await?;

    println!();
    println!("✓ Applied to '{}' (application {})", opportunity.title, application_id);
    Ok(())
}

fn print_summary_line(opportunity: &Opportunity) {
    println!("• {} [{}]", opportunity.title, opportunity.opportunity_type);
    println!(
        "  {} | {} | {} | ID: {}",
        opportunity.company, opportunity.location, opportunity.deadline, opportunity.id
    );
}
