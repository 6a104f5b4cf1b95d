use thiserror::Error;

use crate::models::Student;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid parent phone number: {0}")]
    InvalidPhone(String),
    #[error("roll number {0} already exists")]
    DuplicateRollNumber(String),
    #[error("no student with id {0}")]
    NotFound(u32),
}

/// Partial field set applied by `Roster::update_student`.
#[derive(Debug, Default, Clone)]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub roll_no: Option<String>,
    pub class: Option<String>,
    pub parent_phone: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn new(students: Vec<Student>) -> Self {
        Roster { students }
    }

    pub fn add_student(
        &mut self,
        name: &str,
        roll_no: &str,
        class: &str,
        parent_phone: &str,
    ) -> Result<&Student, RosterError> {
        let name = required(name, "name")?;
        let roll_no = required(roll_no, "roll number")?;
        let class = required(class, "class")?;
        let parent_phone = required(parent_phone, "parent phone")?;

        if !is_valid_phone(&parent_phone) {
            return Err(RosterError::InvalidPhone(parent_phone));
        }
        if self.find_by_roll_no(&roll_no).is_some() {
            return Err(RosterError::DuplicateRollNumber(roll_no));
        }

        let id = self.next_id();
        self.students.push(Student {
            id,
            name,
            roll_no,
            class,
            parent_phone,
        });
        Ok(&self.students[self.students.len() - 1])
    }

    pub fn update_student(
        &mut self,
        id: u32,
        update: StudentUpdate,
    ) -> Result<&Student, RosterError> {
        let index = self
            .students
            .iter()
            .position(|s| s.id == id)
            .ok_or(RosterError::NotFound(id))?;

        let mut candidate = self.students[index].clone();
        if let Some(name) = update.name {
            candidate.name = required(&name, "name")?;
        }
        if let Some(roll_no) = update.roll_no {
            candidate.roll_no = required(&roll_no, "roll number")?;
        }
        if let Some(class) = update.class {
            candidate.class = required(&class, "class")?;
        }
        if let Some(phone) = update.parent_phone {
            let phone = required(&phone, "parent phone")?;
            if !is_valid_phone(&phone) {
                return Err(RosterError::InvalidPhone(phone));
            }
            candidate.parent_phone = phone;
        }

        // Roll numbers stay unique across the roster, excluding the student itself.
        if self
            .students
            .iter()
            .any(|s| s.id != id && s.roll_no == candidate.roll_no)
        {
            return Err(RosterError::DuplicateRollNumber(candidate.roll_no));
        }

        self.students[index] = candidate;
        Ok(&self.students[index])
    }

    pub fn find_by_id(&self, id: u32) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn find_by_roll_no(&self, roll_no: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.roll_no == roll_no)
    }

    pub fn all(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    // Ids are issued monotonically and never reused.
    fn next_id(&self) -> u32 {
        self.students.iter().map(|s| s.id).max().map_or(1, |max| max + 1)
    }
}

fn required(value: &str, field: &'static str) -> Result<String, RosterError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RosterError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

// Optional leading +, then 1-16 digits with no leading zero. Spaces, dashes
// and parentheses are stripped before checking.
fn is_valid_phone(raw: &str) -> bool {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if digits.is_empty() || digits.len() > 16 {
        return false;
    }
    digits.starts_with(|c: char| ('1'..='9').contains(&c))
        && digits.chars().all(|c| c.is_ascii_digit())
}
