use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use openmrs::{Credentials, RestClient};
use supply_core::basket::{find_existing, group};
use supply_core::order::{create_empty_order, order_detail_summary};
use supply_core::{
    ConceptRef, JsonFileBasketStore, OrderBasket, OrderBasketItem, OrderError, OrderFormData,
    OrderUrgency, QuantityUnitLookup, QuantityUnits, SupplyConfig,
};
use supply_types::ResourceUuid;

#[derive(Parser)]
#[command(name = "supply-order")]
#[command(about = "Medical supply order basket")]
struct Cli {
    /// Configuration file (YAML, or JSON when the name ends in .json)
    #[arg(long, env = "SUPPLY_ORDER_CONFIG")]
    config: Option<PathBuf>,

    /// Basket store file
    #[arg(long, env = "SUPPLY_ORDER_BASKET", default_value = "basket.json")]
    basket: PathBuf,

    /// Order type whose basket is used (default: first configured order type)
    #[arg(long)]
    order_type: Option<String>,

    #[command(flatten)]
    server: ServerArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ServerArgs {
    /// Server base URL
    #[arg(
        long,
        env = "OPENMRS_BASE_URL",
        default_value = "http://localhost:8080/openmrs"
    )]
    base_url: String,

    /// REST username
    #[arg(long, env = "OPENMRS_USERNAME")]
    username: Option<String>,

    /// REST password
    #[arg(long, env = "OPENMRS_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Args)]
struct FormArgs {
    /// Quantity
    #[arg(long)]
    quantity: Option<u32>,
    /// Quantity units concept UUID
    #[arg(long)]
    units: Option<String>,
    /// Priority: ROUTINE, STAT or ON_SCHEDULED_DATE
    #[arg(long)]
    urgency: Option<String>,
    /// Scheduled date (YYYY-MM-DD), with ON_SCHEDULED_DATE priority
    #[arg(long)]
    scheduled_date: Option<NaiveDate>,
    /// Free-text instructions
    #[arg(long)]
    instructions: Option<String>,
    /// Reference number
    #[arg(long)]
    reference: Option<String>,
}

impl FormArgs {
    fn is_empty(&self) -> bool {
        self.quantity.is_none()
            && self.units.is_none()
            && self.urgency.is_none()
            && self.scheduled_date.is_none()
            && self.instructions.is_none()
            && self.reference.is_none()
    }

    /// Write the given flags over the form pre-filled from `initial`.
    fn to_form(
        &self,
        initial: &OrderBasketItem,
        units: &QuantityUnits,
    ) -> anyhow::Result<OrderFormData> {
        let mut form = OrderFormData::from_item(initial);
        if let Some(urgency) = &self.urgency {
            form.urgency = Some(urgency.parse::<OrderUrgency>()?);
        }
        if self.scheduled_date.is_some() {
            form.scheduled_date = self.scheduled_date;
        }
        if self.quantity.is_some() {
            form.quantity = self.quantity;
        }
        if let Some(uuid) = &self.units {
            if let Some(error) = &units.error {
                anyhow::bail!("quantity units could not be fetched: {error}");
            }
            let unit = units
                .find(uuid)
                .with_context(|| format!("{uuid} is not one of the offered quantity units"))?;
            form.quantity_units = Some(ConceptRef::from(unit));
        }
        if self.instructions.is_some() {
            form.instructions = self.instructions.clone();
        }
        if self.reference.is_some() {
            form.accession_number = self.reference.clone();
        }
        Ok(form)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print the resolved settings
    CheckConfig,
    /// List the quantity units offered on the order form
    QuantityUnits,
    /// Add a new order for a concept, or edit the one already in the basket
    Add {
        /// Orderable concept UUID
        concept: String,
        /// Concept display name
        #[arg(long, default_value = "")]
        display: String,
        /// Provider placing the order
        #[arg(long)]
        provider: String,
        #[command(flatten)]
        form: FormArgs,
    },
    /// Show the basket grouped for display
    List,
    /// Remove the basket entry at a position (as shown by `list`)
    Remove {
        index: usize,
    },
    /// Print the submission payload of every basket entry
    Payloads {
        /// Patient UUID
        #[arg(long)]
        patient: String,
        /// Encounter UUID
        #[arg(long)]
        encounter: Option<String>,
    },
    /// Revise a placed order
    Modify {
        /// Placed order UUID
        order: String,
        /// Provider revising the order
        #[arg(long)]
        provider: Option<String>,
        #[command(flatten)]
        form: FormArgs,
    },
    /// Discontinue a placed order
    Cancel {
        /// Placed order UUID
        order: String,
    },
    /// Show a placed order's details
    ShowOrder {
        /// Placed order UUID
        order: String,
    },
}

/// Main entry point for the supply order CLI
///
/// Loads the configuration, opens the basket of the selected order type and runs one
/// subcommand against it. Subcommands that need placed orders or quantity units call the
/// REST API.
///
/// # Environment Variables
/// - `OPENMRS_BASE_URL`: server base URL (default: "http://localhost:8080/openmrs")
/// - `OPENMRS_USERNAME`: REST username (basic auth is sent only with a password as well)
/// - `OPENMRS_PASSWORD`: REST password
/// - `SUPPLY_ORDER_CONFIG`: configuration file (default: built-in configuration)
/// - `SUPPLY_ORDER_BASKET`: basket store file (default: "basket.json")
///
/// Each can also be given as a command-line flag; a `.env` file is read first.
///
/// # Returns
/// * `Ok(())` - If the subcommand completed
/// * `Err(anyhow::Error)` - If configuration, the basket store, the REST call or the order form
///   failed
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("supply_order=info".parse()?)
                .add_directive("supply_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SupplyConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => SupplyConfig::default(),
    };

    let order_type = match &cli.order_type {
        Some(uuid) => config
            .order_type(uuid)
            .with_context(|| format!("order type {uuid} is not configured"))?,
        None => config
            .order_types()
            .first()
            .context("no order type configured")?,
    };
    let basket = OrderBasket::new(
        JsonFileBasketStore::new(&cli.basket),
        order_type.order_type_uuid.as_str(),
    );
    tracing::debug!(
        "using basket {} for order type {}",
        cli.basket.display(),
        basket.order_type_uuid()
    );
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Some(Commands::CheckConfig) => {
            for t in config.order_types() {
                println!("Order type: {}", t.order_type_uuid);
                for set in &t.orderable_concept_sets {
                    println!("  Orderable concept set: {}", set);
                }
            }
            let units = config.quantity_units();
            println!("Quantity units: {} ({:?})", units.concept_uuid, units.map);
            println!(
                "Reference number field: {}",
                if config.show_reference_number_field() {
                    "shown"
                } else {
                    "hidden"
                }
            );
        }
        Some(Commands::QuantityUnits) => {
            let lookup = QuantityUnitLookup::new(rest_client(&cli.server)?);
            let units = lookup.load(config.quantity_units()).await;
            if let Some(error) = &units.error {
                anyhow::bail!("quantity units could not be fetched: {error}");
            }
            for unit in &units.concepts {
                println!("{}  {}", unit.uuid, unit.display);
            }
        }
        Some(Commands::Add {
            concept,
            display,
            provider,
            form,
        }) => {
            let candidate = create_empty_order(ConceptRef::new(concept, display), provider.clone());
            let orders = basket.orders()?;
            let initial = find_existing(&orders, &candidate)
                .cloned()
                .unwrap_or(candidate);

            let lookup = QuantityUnitLookup::new(rest_client(&cli.server)?);
            let units = lookup.load(config.quantity_units()).await;
            let form = form.to_form(&initial, &units)?;

            let orders = submit(&basket, &initial, form, &provider, &units, today)?;
            println!("Basket has {} item(s)", orders.len());
        }
        Some(Commands::List) => {
            let orders = basket.orders()?;
            let groups = group(&orders);
            if groups.is_empty() {
                println!("Basket is empty.");
            }
            for (title, entries) in [
                ("Incomplete", &groups.incomplete),
                ("New", &groups.new),
                ("Renewed", &groups.renewed),
                ("Revised", &groups.revised),
                ("Discontinued", &groups.discontinued),
            ] {
                if entries.is_empty() {
                    continue;
                }
                println!("{title}:");
                for (index, item) in entries {
                    println!("  [{index}] {}", describe(item));
                }
            }
        }
        Some(Commands::Remove { index }) => {
            let orders = basket.remove(index)?;
            println!("Basket has {} item(s)", orders.len());
        }
        Some(Commands::Payloads { patient, encounter }) => {
            let payloads = basket.payloads(&patient, encounter.as_deref())?;
            let bodies = payloads
                .iter()
                .map(|p| p.to_json())
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", serde_json::to_string_pretty(&bodies)?);
        }
        Some(Commands::Modify {
            order,
            provider,
            form,
        }) => {
            let client = rest_client(&cli.server)?;
            let placed = client.get_order(&ResourceUuid::new(&order)?).await?;
            let revised = basket.modify(&placed)?;
            println!("Added revision of order {}", placed.uuid);

            if !form.is_empty() {
                let provider = provider.context("--provider is required to save form values")?;
                let lookup = QuantityUnitLookup::new(client);
                let units = lookup.load(config.quantity_units()).await;
                let form = form.to_form(&revised, &units)?;
                submit(&basket, &revised, form, &provider, &units, today)?;
                println!("Saved revision of order {}", placed.uuid);
            }
        }
        Some(Commands::Cancel { order }) => {
            let client = rest_client(&cli.server)?;
            let placed = client.get_order(&ResourceUuid::new(&order)?).await?;
            basket.cancel(&placed)?;
            println!("Added discontinuation of order {}", placed.uuid);
        }
        Some(Commands::ShowOrder { order }) => {
            let client = rest_client(&cli.server)?;
            let placed = client.get_order(&ResourceUuid::new(&order)?).await?;
            println!(
                "{} {}",
                placed.order_number.as_deref().unwrap_or(&placed.uuid),
                placed.display.as_deref().unwrap_or(&placed.concept.uuid)
            );
            for line in order_detail_summary(&placed) {
                println!("  {line}");
            }
        }
        None => {
            println!("Use 'supply-order --help' for commands");
        }
    }

    Ok(())
}

/// Build the REST client from the server flags.
///
/// Credentials are attached only when both a username and a password are set.
fn rest_client(server: &ServerArgs) -> anyhow::Result<RestClient> {
    let credentials = match (&server.username, &server.password) {
        (Some(username), Some(password)) => Some(Credentials {
            username: username.clone(),
            password: password.clone(),
        }),
        _ => None,
    };
    Ok(RestClient::new(&server.base_url, credentials)?)
}

/// Submit a form, printing field messages when it does not validate.
fn submit(
    basket: &OrderBasket<JsonFileBasketStore>,
    initial: &OrderBasketItem,
    form: OrderFormData,
    provider: &str,
    units: &QuantityUnits,
    today: NaiveDate,
) -> anyhow::Result<Vec<OrderBasketItem>> {
    match basket.submit(initial, form, provider, units, today) {
        Err(OrderError::Validation(errors)) => {
            eprintln!("{}", errors.summary());
            for error in &errors.fields {
                eprintln!("  {}: {}", error.field.name(), error.message);
            }
            anyhow::bail!("order form is invalid")
        }
        other => Ok(other?),
    }
}

fn describe(item: &OrderBasketItem) -> String {
    let name = if item.display.is_empty() {
        &item.concept.uuid
    } else {
        &item.display
    };
    let mut line = format!("{} {}", item.action, name);
    if let Some(quantity) = item.quantity {
        line.push_str(&format!(" x{quantity}"));
        if let Some(units) = &item.quantity_units {
            line.push_str(&format!(" {}", units.display));
        }
    }
    if let Some(urgency) = item.urgency {
        line.push_str(&format!(" ({})", urgency.label()));
    }
    line
}
