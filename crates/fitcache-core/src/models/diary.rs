use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MealType::Breakfast => write!(f, "Breakfast"),
            MealType::Lunch => write!(f, "Lunch"),
            MealType::Dinner => write!(f, "Dinner"),
            MealType::Snack => write!(f, "Snack"),
        }
    }
}

impl std::str::FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            _ => Err(format!("Unknown meal type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "mealType")]
    pub meal_type: MealType,
    pub calories: u32,
    #[serde(rename = "proteinG", default)]
    pub protein_g: f32,
    #[serde(rename = "carbsG", default)]
    pub carbs_g: f32,
    #[serde(rename = "fatG", default)]
    pub fat_g: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub meals: Vec<MealEntry>,
}

/// Calorie counts come from the server; sums saturate rather than overflow.
fn saturating_total(calories: impl Iterator<Item = u32>) -> u32 {
    calories.fold(0u32, u32::saturating_add)
}

impl DiaryDay {
    pub fn total_calories(&self) -> u32 {
        saturating_total(self.meals.iter().map(|m| m.calories))
    }

    pub fn calories_for(&self, meal_type: MealType) -> u32 {
        saturating_total(
            self.meals
                .iter()
                .filter(|m| m.meal_type == meal_type)
                .map(|m| m.calories),
        )
    }
}

/// One month of the food diary as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodDiaryMonth {
    pub year: i32,
    pub month: u32,
    #[serde(default)]
    pub days: Vec<DiaryDay>,
}

impl FoodDiaryMonth {
    pub fn empty(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            days: Vec::new(),
        }
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DiaryDay> {
        if date.year() != self.year || date.month() != self.month {
            return None;
        }
        self.days.iter().find(|d| d.date == date)
    }

    pub fn total_calories(&self) -> u32 {
        saturating_total(self.days.iter().map(DiaryDay::total_calories))
    }

    /// Average calories over days that have at least one logged meal.
    pub fn average_logged_calories(&self) -> Option<u32> {
        let logged: Vec<u64> = self
            .days
            .iter()
            .filter(|d| !d.meals.is_empty())
            .map(|d| u64::from(d.total_calories()))
            .collect();
        if logged.is_empty() {
            None
        } else {
            // The mean of u32 values always fits back into a u32
            let average = logged.iter().sum::<u64>() / logged.len() as u64;
            Some(u32::try_from(average).unwrap_or(u32::MAX))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meal(id: &str, meal_type: MealType, calories: u32) -> MealEntry {
        MealEntry {
            id: id.to_string(),
            name: id.to_string(),
            meal_type,
            calories,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
        }
    }

    fn month() -> FoodDiaryMonth {
        FoodDiaryMonth {
            year: 2025,
            month: 1,
            days: vec![
                DiaryDay {
                    date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                    meals: vec![
                        meal("oats", MealType::Breakfast, 350),
                        meal("salad", MealType::Lunch, 450),
                        meal("apple", MealType::Snack, 95),
                    ],
                },
                DiaryDay {
                    date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
                    meals: vec![],
                },
                DiaryDay {
                    date: NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
                    meals: vec![meal("pasta", MealType::Dinner, 705)],
                },
            ],
        }
    }

    #[test]
    fn test_day_totals() {
        let m = month();
        let day = m.day(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()).unwrap();
        assert_eq!(day.total_calories(), 895);
        assert_eq!(day.calories_for(MealType::Lunch), 450);
        assert_eq!(day.calories_for(MealType::Dinner), 0);
    }

    #[test]
    fn test_day_outside_month_is_none() {
        let m = month();
        assert!(m.day(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()).is_none());
    }

    #[test]
    fn test_average_skips_empty_days() {
        let m = month();
        assert_eq!(m.total_calories(), 1600);
        assert_eq!(m.average_logged_calories(), Some(800));
        assert_eq!(FoodDiaryMonth::empty(2025, 1).average_logged_calories(), None);
    }

    #[test]
    fn test_totals_saturate_on_huge_values() {
        let day = DiaryDay {
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            meals: vec![
                meal("a", MealType::Snack, u32::MAX),
                meal("b", MealType::Snack, 1),
            ],
        };
        assert_eq!(day.total_calories(), u32::MAX);
        assert_eq!(day.calories_for(MealType::Snack), u32::MAX);

        let m = FoodDiaryMonth {
            year: 2025,
            month: 1,
            days: vec![
                day.clone(),
                DiaryDay {
                    date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
                    ..day
                },
            ],
        };
        assert_eq!(m.total_calories(), u32::MAX);
        assert_eq!(m.average_logged_calories(), Some(u32::MAX));
    }

    #[test]
    fn test_meal_type_wire_format() {
        let json = r#"{"id":"1","name":"Eggs","mealType":"breakfast","calories":140}"#;
        let entry: MealEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.meal_type, MealType::Breakfast);
        assert_eq!(entry.meal_type.to_string(), "Breakfast");
        assert_eq!("Snack".parse::<MealType>().unwrap(), MealType::Snack);
        assert!("brunch".parse::<MealType>().is_err());
    }
}
