use crate::admin::{CategoryDraft, ContactDraft, VideoDraft};

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
  Login,
  Video,
  Category,
  Contact,
}

impl FormKind {
  pub fn title(self) -> &'static str {
    match self {
      FormKind::Login => "Admin sign-in",
      FormKind::Video => "New video",
      FormKind::Category => "New category",
      FormKind::Contact => "Contact us",
    }
  }

  pub fn submit_label(self) -> &'static str {
    match self {
      FormKind::Login => "Sign in",
      FormKind::Video | FormKind::Category => "Create",
      FormKind::Contact => "Send",
    }
  }
}

/// One labelled single-line text input.
#[derive(Debug, Clone, Default)]
pub struct Field {
  pub label: &'static str,
  pub value: String,
  /// Cursor position within `value` (char index).
  pub cursor: usize,
  /// Horizontal scroll offset, maintained by the renderer.
  pub scroll: usize,
  pub secret: bool,
}

impl Field {
  fn new(label: &'static str) -> Self {
    Self { label, ..Self::default() }
  }

  fn secret(label: &'static str) -> Self {
    Self { label, secret: true, ..Self::default() }
  }

  fn with_value(mut self, value: &str) -> Self {
    self.value = value.to_string();
    self.cursor = self.value.chars().count();
    self
  }

  /// Text as it should be shown, with secrets masked.
  pub fn display(&self) -> String {
    if self.secret { "•".repeat(self.value.chars().count()) } else { self.value.clone() }
  }

  pub fn insert(&mut self, c: char) {
    let byte_idx = char_to_byte_index(&self.value, self.cursor);
    self.value.insert(byte_idx, c);
    self.cursor += 1;
  }

  pub fn backspace(&mut self) {
    if self.cursor > 0 {
      self.cursor -= 1;
      let byte_idx = char_to_byte_index(&self.value, self.cursor);
      self.value.remove(byte_idx);
    }
  }

  pub fn delete(&mut self) {
    if self.cursor < self.value.chars().count() {
      let byte_idx = char_to_byte_index(&self.value, self.cursor);
      self.value.remove(byte_idx);
    }
  }

  pub fn left(&mut self) {
    self.cursor = self.cursor.saturating_sub(1);
  }

  pub fn right(&mut self) {
    if self.cursor < self.value.chars().count() {
      self.cursor += 1;
    }
  }

  pub fn home(&mut self) {
    self.cursor = 0;
  }

  pub fn end(&mut self) {
    self.cursor = self.value.chars().count();
  }
}

#[derive(Debug, Clone)]
pub struct Form {
  pub kind: FormKind,
  pub fields: Vec<Field>,
  pub focus: usize,
}

impl Form {
  pub fn login(email: Option<&str>) -> Self {
    let email = Field::new("Email").with_value(email.unwrap_or(""));
    let focus = usize::from(!email.value.is_empty());
    Self { kind: FormKind::Login, fields: vec![email, Field::secret("Password")], focus }
  }

  /// New video form, pre-filled with the category being browsed if any.
  pub fn video(category: Option<&str>) -> Self {
    let fields =
      vec![Field::new("Title"), Field::new("Category").with_value(category.unwrap_or("")), Field::new("Video URL")];
    Self { kind: FormKind::Video, fields, focus: 0 }
  }

  pub fn category() -> Self {
    Self { kind: FormKind::Category, fields: vec![Field::new("Name")], focus: 0 }
  }

  pub fn contact() -> Self {
    let fields = vec![Field::new("Name"), Field::new("Email"), Field::new("Phone"), Field::new("Message")];
    Self { kind: FormKind::Contact, fields, focus: 0 }
  }

  pub fn focused(&mut self) -> &mut Field {
    let focus = self.focus.min(self.fields.len().saturating_sub(1));
    &mut self.fields[focus]
  }

  pub fn focus_next(&mut self) {
    if !self.fields.is_empty() {
      self.focus = (self.focus + 1) % self.fields.len();
    }
  }

  pub fn focus_previous(&mut self) {
    if !self.fields.is_empty() {
      self.focus = if self.focus == 0 { self.fields.len() - 1 } else { self.focus - 1 };
    }
  }

  pub fn is_last_field(&self) -> bool {
    self.focus + 1 >= self.fields.len()
  }

  pub fn value(&self, label: &str) -> &str {
    self.fields.iter().find(|f| f.label == label).map_or("", |f| f.value.as_str())
  }

  pub fn video_draft(&self) -> VideoDraft {
    VideoDraft {
      title: self.value("Title").to_string(),
      category: self.value("Category").to_string(),
      source_url: self.value("Video URL").to_string(),
    }
  }

  pub fn category_draft(&self) -> CategoryDraft {
    CategoryDraft { name: self.value("Name").to_string() }
  }

  pub fn contact_draft(&self) -> ContactDraft {
    ContactDraft {
      name: self.value("Name").to_string(),
      email: self.value("Email").to_string(),
      phone: self.value("Phone").to_string(),
      message: self.value("Message").to_string(),
    }
  }
}
