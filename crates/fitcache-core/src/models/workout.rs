use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub sets: u32,
    #[serde(default)]
    pub reps: u32,
    #[serde(rename = "restSecs", default)]
    pub rest_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramWeek {
    pub week: u32,
    #[serde(default)]
    pub workouts: Vec<Workout>,
}

/// The workout program assigned to the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub weeks: Vec<ProgramWeek>,
}

impl ProgramDocument {
    pub fn total_workouts(&self) -> usize {
        self.weeks.iter().map(|w| w.workouts.len()).sum()
    }

    /// Workout for a 1-based week and day, if the program schedules one.
    pub fn workout(&self, week: u32, day: u32) -> Option<&Workout> {
        self.weeks
            .iter()
            .find(|w| w.week == week)
            .and_then(|w| w.workouts.iter().find(|wo| wo.day == day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_lookup() {
        let json = r#"{
            "id": "p1",
            "name": "Beginner Strength",
            "weeks": [
                {"week": 1, "workouts": [
                    {"day": 1, "title": "Full body A", "exercises": [{"name": "Squat", "sets": 3, "reps": 8}]},
                    {"day": 3, "title": "Full body B"}
                ]},
                {"week": 2, "workouts": [{"day": 1, "title": "Full body A"}]}
            ]
        }"#;
        let program: ProgramDocument = serde_json::from_str(json).unwrap();
        assert_eq!(program.total_workouts(), 3);
        assert_eq!(program.workout(1, 3).unwrap().title, "Full body B");
        assert_eq!(program.workout(1, 1).unwrap().exercises[0].rest_secs, 0);
        assert!(program.workout(2, 2).is_none());
    }
}
