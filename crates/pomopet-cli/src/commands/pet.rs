use chrono::Local;
use pomopet_core::Database;
use serde_json::json;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let today = Local::now().date_naive();
    let pet = db.load_pet()?;
    let streak = db.load_streak()?;

    let out = json!({
        "pet": pet,
        "exp_progress": pet.exp_progress(),
        "rewarded_today": pet.rewarded_on(today),
        "streak": {
            "current": streak.current_as_of(today),
            "longest": streak.longest,
            "last_date": streak.last_date,
        },
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
