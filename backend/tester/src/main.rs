use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Result, bail};
use clap::Parser;
use reqwest::{Client, Response};
use serde_json::{Value, json};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "http://localhost:4000")]
    base_url: String,

    /// Defaults to a fresh address so reruns register a new account
    #[arg(long)]
    email: Option<String>,

    #[arg(long, default_value = "hunter2")]
    password: String,
}

async fn json_or_fail(step: &str, response: Response) -> Result<Value> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        bail!("{step} failed with {status}: {body}");
    }

    println!("{step}: {status}");
    Ok(body)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = Client::new();
    let base = args.base_url.trim_end_matches('/');

    let email = args.email.unwrap_or_else(|| {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        format!("tester+{stamp}@example.com")
    });

    let register = client
        .post(format!("{base}/api/register"))
        .json(&json!({ "name": "Tester", "email": email, "password": args.password }))
        .send()
        .await?;
    json_or_fail("Register", register).await?;

    let login = client
        .post(format!("{base}/api/login"))
        .json(&json!({ "email": email, "password": args.password }))
        .send()
        .await?;
    let token = json_or_fail("Login", login).await?["token"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    let meals = client.get(format!("{base}/api/meals")).send().await?;
    let meals = json_or_fail("Meals", meals).await?;
    let Some(meals) = meals.as_array().filter(|meals| !meals.is_empty()) else {
        bail!("Catalog is empty, nothing to order");
    };
    println!("Catalog has {} meals", meals.len());

    let line_items: Vec<Value> = meals
        .iter()
        .take(2)
        .enumerate()
        .map(|(index, meal)| {
            json!({ "mealId": meal["_id"], "quantity": index + 1, "price": meal["price"] })
        })
        .collect();

    let order = client
        .post(format!("{base}/api/orders"))
        .bearer_auth(&token)
        .json(&json!({ "meals": line_items }))
        .send()
        .await?;
    let order = json_or_fail("Place order", order).await?;
    println!("Order {} total {}", order["order"]["_id"], order["order"]["total"]);

    let orders = client
        .get(format!("{base}/api/order"))
        .bearer_auth(&token)
        .send()
        .await?;
    let orders = json_or_fail("List orders", orders).await?;
    println!(
        "{} has {} order(s)",
        email,
        orders.as_array().map(Vec::len).unwrap_or_default()
    );

    let unauthorized = client
        .post(format!("{base}/api/orders"))
        .json(&json!({ "meals": [] }))
        .send()
        .await?;
    if unauthorized.status() != reqwest::StatusCode::UNAUTHORIZED {
        bail!("Order without token returned {}", unauthorized.status());
    }
    println!("Order without token: {}", unauthorized.status());

    Ok(())
}
