//! Calorie and TDEE calculations for onboarding and the diary.
//!
//! BMR uses the Mifflin-St Jeor equation; TDEE applies a standard activity
//! multiplier; the daily goal adds a fixed adjustment for the user's goal and
//! never drops below a sex-specific floor.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum daily goal for men, in kcal.
const MIN_CALORIES_MALE: u32 = 1500;

/// Minimum daily goal for women, in kcal.
const MIN_CALORIES_FEMALE: u32 = 1200;

/// Daily deficit for weight loss (about 0.5 kg per week).
const LOSE_ADJUSTMENT: f64 = -500.0;

/// Daily surplus for lean weight gain.
const GAIN_ADJUSTMENT: f64 = 300.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("Age must be between 13 and 120 years, got {0}")]
    Age(u32),

    #[error("Height must be between 100 and 250 cm, got {0}")]
    Height(f64),

    #[error("Weight must be between 30 and 300 kg, got {0}")]
    Weight(f64),

    #[error("Unrecognized value: {0}")]
    Unrecognized(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl FromStr for Sex {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            _ => Err(CalcError::Unrecognized(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            "very_active" => Ok(ActivityLevel::VeryActive),
            _ => Err(CalcError::Unrecognized(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}

impl Goal {
    pub fn adjustment(&self) -> f64 {
        match self {
            Goal::Lose => LOSE_ADJUSTMENT,
            Goal::Maintain => 0.0,
            Goal::Gain => GAIN_ADJUSTMENT,
        }
    }
}

impl FromStr for Goal {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lose" => Ok(Goal::Lose),
            "maintain" => Ok(Goal::Maintain),
            "gain" => Ok(Goal::Gain),
            _ => Err(CalcError::Unrecognized(s.to_string())),
        }
    }
}

/// Answers from the onboarding questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub sex: Sex,
    pub age_years: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity: ActivityLevel,
    pub goal: Goal,
}

impl Profile {
    pub fn validate(&self) -> Result<(), CalcError> {
        if !(13..=120).contains(&self.age_years) {
            return Err(CalcError::Age(self.age_years));
        }
        if !(100.0..=250.0).contains(&self.height_cm) {
            return Err(CalcError::Height(self.height_cm));
        }
        if !(30.0..=300.0).contains(&self.weight_kg) {
            return Err(CalcError::Weight(self.weight_kg));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Macros {
    pub protein_g: u32,
    pub carbs_g: u32,
    pub fat_g: u32,
}

/// Basal metabolic rate in kcal/day.
pub fn bmr(profile: &Profile) -> Result<f64, CalcError> {
    profile.validate()?;
    let base = 10.0 * profile.weight_kg + 6.25 * profile.height_cm - 5.0 * profile.age_years as f64;
    Ok(match profile.sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    })
}

/// Total daily energy expenditure in kcal/day.
pub fn tdee(profile: &Profile) -> Result<f64, CalcError> {
    Ok(bmr(profile)? * profile.activity.multiplier())
}

pub fn daily_calorie_goal(profile: &Profile) -> Result<u32, CalcError> {
    let target = (tdee(profile)? + profile.goal.adjustment()).round().max(0.0) as u32;
    let floor = match profile.sex {
        Sex::Male => MIN_CALORIES_MALE,
        Sex::Female => MIN_CALORIES_FEMALE,
    };
    Ok(target.max(floor))
}

/// 30% protein, 40% carbs, 30% fat, in grams.
pub fn macro_split(calories: u32) -> Macros {
    let kcal = calories as f64;
    Macros {
        protein_g: (kcal * 0.30 / 4.0).round() as u32,
        carbs_g: (kcal * 0.40 / 4.0).round() as u32,
        fat_g: (kcal * 0.30 / 9.0).round() as u32,
    }
}

/// Calories left for the day. Negative when over the goal.
pub fn remaining_calories(goal: u32, eaten: u32, burned: u32) -> i64 {
    goal as i64 - eaten as i64 + burned as i64
}
