//! C harness generation for a finalized scenario.

use std::fmt::Write as _;

use crate::recorder::{Scenario, Step};

/// Status when the first whole-program update fails.
const INITIAL_UPDATE_FAILED: i32 = 255;
/// Status when a later single-file update fails.
const UPDATE_FAILED: i32 = 252;
const NO_ENTRY_POINT: i32 = 254;
const RESULT_MISMATCH: i32 = 253;

const PRELUDE: &str = r#"#include "libdyibicc.h"
#include <stdio.h>
#include <stdlib.h>
#include <string.h>
"#;

const DISK_FALLBACK: &str = r#"  // Anything else (headers, later reloads) comes from disk.
  FILE* fp = fopen(filename, "rb");
  if (!fp) {
    return false;
  }
  fseek(fp, 0, SEEK_END);
  long length = ftell(fp);
  rewind(fp);
  if (length < 0) {
    fclose(fp);
    return false;
  }
  *size = (size_t)length;
  *contents = malloc(*size + 1);
  if (!*contents) {
    fclose(fp);
    return false;
  }
  size_t got = fread(*contents, 1, *size, fp);
  fclose(fp);
  if (got != *size) {
    free(*contents);
    *contents = NULL;
    return false;
  }
  (*contents)[*size] = '\0';
  return true;
}
"#;

const ENVIRONMENT: &str = r#"  DyibiccEnviromentData env_data = {
      .include_paths = (const char**)include_paths,
      .files = (const char**)input_paths,
      .dyibicc_include_dir = "./include",
      .load_file_contents = load_file,
      .get_function_address = NULL,
      .output_function = NULL,
      .use_ansi_codes = false,
  };

  DyibiccContext* ctx = dyibicc_set_environment(&env_data);

  int final_result = 0;
"#;

/// Quotes `text` as a C string literal.
fn c_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for byte in text.bytes() {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            // Trigraph sequences start with `??`.
            b'?' => out.push_str("\\?"),
            0x20..=0x7e => out.push(char::from(byte)),
            _ => {
                let _ = write!(out, "\\{byte:03o}");
            }
        }
    }
    out.push('"');
    out
}

/// Brace initializer holding the UTF-8 bytes of `text` and a trailing NUL.
fn byte_array(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 5 + 8);
    out.push('{');
    for byte in text.bytes() {
        let _ = write!(out, "0x{byte:02x},");
    }
    out.push_str("0x00}");
    out
}

fn render_loader(out: &mut String, scenario: &Scenario) {
    out.push_str(
        "\nstatic bool load_file(const char* filename, char** contents, size_t* size) {\n",
    );
    for (index, (name, text)) in scenario.initial_contents().iter().enumerate() {
        let len = text.len();
        let _ = writeln!(out, "  static bool served_{index} = false;");
        let _ = writeln!(
            out,
            "  if (!served_{index} && strcmp({}, filename) == 0) {{",
            c_string(name)
        );
        let _ = writeln!(
            out,
            "    static const unsigned char initial_{index}[] = {};",
            byte_array(text)
        );
        let _ = writeln!(out, "    served_{index} = true;");
        // The compiler takes ownership and frees the buffer.
        let _ = writeln!(out, "    *contents = malloc({len} + 1);");
        let _ = writeln!(out, "    if (!*contents) {{\n      return false;\n    }}");
        let _ = writeln!(out, "    memcpy(*contents, initial_{index}, {len} + 1);");
        let _ = writeln!(out, "    *size = {len};");
        let _ = writeln!(out, "    return true;\n  }}\n");
    }
    out.push_str(DISK_FALLBACK);
}

fn render_path_list(out: &mut String, name: &str, paths: impl Iterator<Item = String>) {
    let _ = writeln!(out, "  char* {name}[] = {{");
    for path in paths {
        let _ = writeln!(out, "    {path},");
    }
    let _ = writeln!(out, "    NULL,\n  }};");
}

fn render_step(out: &mut String, index: usize, step: &Step) {
    match step {
        Step::Update { file, contents } => {
            let _ = write!(
                out,
                "
  static const unsigned char contents_step{index}[] = {array};
  if (!dyibicc_update(ctx, {name}, (char*)contents_step{index})) {{
    printf(\"update of %s failed\\n\", {name});
    final_result = {UPDATE_FAILED};
    goto fail;
  }}
",
                array = byte_array(contents),
                name = c_string(file),
            );
        }
        Step::Assert {
            return_code,
            location,
        } => {
            let _ = write!(
                out,
                "
  {{
    void* entry_point = dyibicc_find_export(ctx, \"main\");
    if (!entry_point) {{
      printf(\"no entry point found\\n\");
      final_result = {NO_ENTRY_POINT};
      goto fail;
    }}
    int myargc = 1;
    char* myargv[] = {{\"prog\", NULL}};
    int result = ((int (*)(int, char**))entry_point)(myargc, myargv);
    if (result != {return_code}) {{
      printf(\"%s: got %d, but expected %d\\n\", {location}, result, {return_code});
      final_result = {RESULT_MISMATCH};
      goto fail;
    }}
    printf(\"%s: OK (%d)\\n\", {location}, result);
  }}
",
                location = c_string(&location.to_string()),
            );
        }
    }
}

/// Renders the standalone C driver for `scenario`.
pub(crate) fn render_program(scenario: &Scenario) -> String {
    let mut out = String::from(PRELUDE);
    render_loader(&mut out, scenario);

    out.push_str("\nint main(void) {\n");
    render_path_list(
        &mut out,
        "include_paths",
        scenario.include_paths().iter().map(|p| c_string(p)),
    );
    render_path_list(
        &mut out,
        "input_paths",
        scenario.tracked_files().map(c_string),
    );
    out.push('\n');
    out.push_str(ENVIRONMENT);
    let _ = write!(
        out,
        "
  if (!dyibicc_update(ctx, NULL, NULL)) {{
    printf(\"initial update failed\\n\");
    final_result = {INITIAL_UPDATE_FAILED};
    goto fail;
  }}
"
    );

    for (index, step) in scenario.steps().iter().enumerate() {
        render_step(&mut out, index, step);
    }

    out.push_str("\n  printf(\"OK\\n\");\nfail:\n  dyibicc_free(ctx);\n  return final_result;\n}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_strings_escape_quotes_and_non_ascii() {
        insta::assert_snapshot!(c_string("a\"b\\c\n\u{e9}??="), @r#""a\"b\\c\n\303\251\?\?=""#);
    }

    #[test]
    fn byte_arrays_end_with_nul() {
        assert_eq!(byte_array(""), "{0x00}");
        assert_eq!(byte_array("A\u{e9}"), "{0x41,0xc3,0xa9,0x00}");
    }
}
