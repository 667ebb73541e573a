use serde::{Deserialize, Serialize};

/// Calorie goal and burn for the current day, shown alongside the diary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    #[serde(rename = "goalCalories", default)]
    pub goal_calories: u32,
    #[serde(rename = "caloriesBurned", default)]
    pub calories_burned: u32,
}
