use std::fs;
use std::path::Path;
use std::process::Command;

fn write_workbook(dir: &Path) {
    fs::write(
        dir.join("Kriterler.csv"),
        "Po,Değerlendirme,Kategori,Period,PuanMax,Personel,Şef,Yönetici\n1,Temizlik,İş,Haftalık,5,x,,x\n",
    )
    .expect("criteria");
    fs::write(
        dir.join("Calisanlar.csv"),
        "Sicil,AdSoyad,Departman,Unvan\n1001,Ayşe Yılmaz,Üretim,Operatör\n",
    )
    .expect("employees");
    fs::write(
        dir.join("Degerlendirmeler.csv"),
        "Sicil,Po,Rol,Puan,Tarih,HaftaYili,Not\n1001,1,Personel,4,2024-03-06 10:00:00,,\n",
    )
    .expect("evaluations");
}

fn personeltak(workbook: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_personeltak"));
    command
        .arg(workbook)
        .env_remove("PERSONELTAK_WORKBOOK")
        .env_remove("PERSONELTAK_TIMEZONE")
        .env("RUST_LOG", "warn");
    command
}

#[test]
fn record_then_summarize_writes_the_weekly_report() {
    let workbook = tempfile::tempdir().expect("workbook dir");
    let reports = tempfile::tempdir().expect("report dir");
    write_workbook(workbook.path());

    let record = personeltak(workbook.path())
        .args([
            "record", "--sicil", "1001", "--rol", "Yönetici", "--po", "1", "--puan", "5",
            "--tarih", "2024-03-07",
        ])
        .output()
        .expect("record runs");
    assert!(
        record.status.success(),
        "record failed: {}",
        String::from_utf8_lossy(&record.stderr)
    );

    let summarize = personeltak(workbook.path())
        .args(["--asof", "2024-03-10", "summarize", "--output"])
        .arg(reports.path())
        .output()
        .expect("summarize runs");
    assert!(
        summarize.status.success(),
        "summarize failed: {}",
        String::from_utf8_lossy(&summarize.stderr)
    );

    let stdout = String::from_utf8_lossy(&summarize.stdout);
    assert!(stdout.contains("Scores for 2024-W10"));
    assert!(stdout.contains("1001 Ayşe Yılmaz (Üretim, Operatör): 93.33"));
    assert!(stdout.contains("Missing evaluations: none"));
    assert!(reports.path().join("rapor_2024-W10.json").exists());
}

#[test]
fn unknown_role_is_rejected_by_the_parser() {
    let workbook = tempfile::tempdir().expect("workbook dir");
    write_workbook(workbook.path());

    let output = personeltak(workbook.path())
        .args(["record", "--sicil", "1001", "--rol", "Müdür", "--po", "1", "--puan", "3"])
        .output()
        .expect("record runs");

    assert!(!output.status.success());
    let contents =
        fs::read_to_string(workbook.path().join("Degerlendirmeler.csv")).expect("read table");
    assert_eq!(contents.lines().count(), 2);
}

#[test]
fn missing_workbook_exits_with_an_error() {
    let root = tempfile::tempdir().expect("root dir");

    let output = personeltak(&root.path().join("yok"))
        .arg("summarize")
        .output()
        .expect("summarize runs");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("workbook not found"));
}
