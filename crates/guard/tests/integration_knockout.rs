//! Integration-Tests fuer den Knockout-Ablauf: ausloesen, bannen, kicken, aufheben

mod common;

use common::*;
use shirk_core::event::AusgehenderBefehl;
use shirk_guard::{ModerationsZustand, WaechterKonfig, WiederherstellungsLog};

fn vorbereiten(dir: &std::path::Path) -> Pruefstand {
    let mut p = Pruefstand::neu(dir, |_| {});
    p.bot_betritt();
    p.beitreten("alice", "a.example");
    p.beitreten("op", "o.example");
    p.macht_setzen("op", 10);
    p.ausgang_nehmen();
    p.geplant_nehmen();
    p
}

#[test]
fn verbotener_befehl_fuehrt_zu_ban_und_kick() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());
    let standard = WaechterKonfig::default().standard_nachricht;

    // Ausloesen: Knockout ausstehend, Privileg angefordert
    p.befehl("alice", &["register", "foo"]);
    assert_eq!(
        p.ausgang_nehmen(),
        vec![
            nachricht("alice: Please wait, processing your request."),
            roh("CHANSERV OP #chat"),
        ]
    );
    match p.waechter.borrow().zustand(RAUM, &identitaet("alice@a.example")) {
        Some(ModerationsZustand::Ausstehend(k)) => {
            assert_eq!(k.dauer_sek, 20);
            assert_eq!(k.nachricht, standard);
        }
        anders => panic!("Knockout erwartet, gefunden: {anders:?}"),
    }

    // Privileg erteilt: Ban fuer die Identitaet
    p.op_erhalten();
    assert_eq!(p.ausgang_nehmen(), vec![modus_befehl("+b *!alice@a.example")]);
    assert!(p.konvergiert());

    // Ban bestaetigt: Kick mit Standardnachricht, Frist = jetzt + 20
    p.vorspulen(3);
    let bestaetigt_um = p.jetzt;
    p.ban_bestaetigen("*!alice@a.example");
    assert_eq!(
        p.ausgang_nehmen(),
        vec![AusgehenderBefehl::Kick {
            raum: RAUM.into(),
            name: "alice".into(),
            grund: standard.clone(),
        }]
    );
    {
        let w = p.waechter.borrow();
        let eintraege = w.wiederherstellungen();
        assert_eq!(eintraege.len(), 1);
        assert_eq!(eintraege[0].frist, bestaetigt_um + chrono::Duration::seconds(20));
        assert_eq!(eintraege[0].name, "alice");
        assert_eq!(w.anzahl_ausstehend(), 0);
    }
    assert!(p.konvergiert());
    assert!(p.log_inhalt().contains("alice@a.example"));
}

#[test]
fn frist_abgelaufen_hebt_ban_auf_und_gibt_privileg_ab() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());
    p.befehl("alice", &["register"]);
    p.op_erhalten();
    p.ban_bestaetigen("*!alice@a.example");
    p.ausgang_nehmen();
    p.geplant_nehmen();

    // Vor der Frist passiert nichts
    p.vorspulen(19);
    p.scan();
    assert!(p.ausgang_nehmen().is_empty());
    assert!(p.waechter.borrow().hat_privileg(RAUM));

    // Ab der Frist: Unban, Eintrag weg, Privileg abgegeben
    p.vorspulen(1);
    p.scan();
    assert_eq!(
        p.ausgang_nehmen(),
        vec![
            modus_befehl("-b *!alice@a.example"),
            roh("CHANSERV DEOP #chat"),
        ]
    );
    assert!(p.waechter.borrow().wiederherstellungen().is_empty());
    assert!(WiederherstellungsLog::neu(&p.log_pfad)
        .laden()
        .unwrap()
        .is_empty());
    assert!(!p.waechter.borrow().hat_privileg(RAUM));
    assert!(p.konvergiert());

    // Scan plant sich selbst neu
    let geplant = p.geplant_nehmen();
    assert_eq!(geplant.len(), 2);
    assert!(geplant.iter().all(|g| g.art == shirk_guard::SCAN));
}

#[test]
fn knockout_befehl_mit_dauer_und_nachricht() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());

    p.befehl("op", &["knockout", "alice", "5", "geh", "schlafen"]);
    assert_eq!(
        p.ausgang_nehmen(),
        vec![
            nachricht("op: Please wait, processing your request."),
            roh("CHANSERV OP #chat"),
        ]
    );
    match p.waechter.borrow().zustand(RAUM, &identitaet("alice@a.example")) {
        Some(ModerationsZustand::Ausstehend(k)) => {
            assert_eq!(k.dauer_sek, 300);
            assert_eq!(k.nachricht, "geh schlafen");
        }
        anders => panic!("Knockout erwartet, gefunden: {anders:?}"),
    }

    // Ohne Zahl ist alles ab dem Namen die Nachricht
    p.beitreten("bob", "b.example");
    p.befehl("op", &["knockout", "bob", "raus", "hier"]);
    match p.waechter.borrow().zustand(RAUM, &identitaet("bob@b.example")) {
        Some(ModerationsZustand::Ausstehend(k)) => {
            assert_eq!(k.dauer_sek, 20);
            assert_eq!(k.nachricht, "raus hier");
        }
        anders => panic!("Knockout erwartet, gefunden: {anders:?}"),
    };
}

#[test]
fn knockout_ohne_stufe_wird_ignoriert() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());

    p.befehl("alice", &["knockout", "op"]);
    assert!(p.ausgang_nehmen().is_empty());
    assert_eq!(p.waechter.borrow().anzahl_ausstehend(), 0);
}

#[test]
fn verbotener_befehl_von_berechtigten_ist_erlaubt() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());

    p.befehl("op", &["register"]);
    assert!(p.ausgang_nehmen().is_empty());
    assert!(!p.waechter.borrow().arbeit_vorhanden(RAUM));
}

#[test]
fn unbekanntes_ziel_bekommt_antwort() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());

    p.befehl("op", &["knockout", "niemand"]);
    assert_eq!(
        p.ausgang_nehmen(),
        vec![nachricht("op: I don't know anyone called niemand.")]
    );
    assert!(!p.waechter.borrow().arbeit_vorhanden(RAUM));
}

#[test]
fn mit_privileg_wird_sofort_gebannt() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());
    p.beitreten("bob", "b.example");

    p.befehl("alice", &["register"]);
    p.op_erhalten();
    p.ausgang_nehmen();

    // Zweiter Knockout, waehrend das Privileg gehalten wird
    p.befehl("bob", &["register"]);
    assert_eq!(
        p.ausgang_nehmen(),
        vec![
            nachricht("bob: Please wait, processing your request."),
            modus_befehl("+b *!bob@b.example"),
        ]
    );
}

#[test]
fn kick_trifft_aktuellen_namen() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());

    p.befehl("alice", &["register"]);
    p.op_erhalten();
    assert!(p.presence.umbenannt("alice", "alice_weg").is_some());
    p.ausgang_nehmen();

    p.ban_bestaetigen("*!alice@a.example");
    match p.ausgang_nehmen().as_slice() {
        [AusgehenderBefehl::Kick { name, .. }] => assert_eq!(name, "alice_weg"),
        anders => panic!("Kick erwartet: {anders:?}"),
    }
    assert_eq!(p.waechter.borrow().wiederherstellungen()[0].name, "alice_weg");
}

#[test]
fn doppelte_ban_bestaetigung_ist_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());
    p.befehl("alice", &["register"]);
    p.op_erhalten();
    p.ban_bestaetigen("*!alice@a.example");
    p.ausgang_nehmen();
    let log_vorher = p.log_inhalt();

    p.vorspulen(5);
    p.ban_bestaetigen("*!alice@a.example");

    assert!(p.ausgang_nehmen().is_empty());
    assert_eq!(p.waechter.borrow().wiederherstellungen().len(), 1);
    assert_eq!(p.log_inhalt(), log_vorher);
}

#[test]
fn unerwartete_und_fremde_bans_werden_ignoriert() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());

    // Eigener Ban ohne Knockout
    p.ban_bestaetigen("*!fremd@x.example");
    // Ban von jemand anderem
    p.modus("op", true, 'b', "*!alice@a.example");
    // Maske in anderem Format
    p.ban_bestaetigen("alice!*@*");

    assert!(p.ausgang_nehmen().is_empty());
    assert!(!p.waechter.borrow().arbeit_vorhanden(RAUM));
    assert!(p.log_inhalt().is_empty());
}

#[test]
fn manueller_unban_entfernt_eintrag() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());
    p.befehl("alice", &["register"]);
    p.op_erhalten();
    p.ban_bestaetigen("*!alice@a.example");
    p.ausgang_nehmen();

    p.modus("op", false, 'b', "*!alice@a.example");

    assert_eq!(p.ausgang_nehmen(), vec![roh("CHANSERV DEOP #chat")]);
    assert!(p.waechter.borrow().wiederherstellungen().is_empty());
    assert!(p.konvergiert());
}

#[test]
fn unangefordertes_privileg_wird_sofort_abgegeben() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());

    p.op_erhalten();
    assert_eq!(p.ausgang_nehmen(), vec![roh("CHANSERV DEOP #chat")]);
    assert!(p.konvergiert());
}

#[test]
fn privileg_bleibt_bis_alle_vorgaenge_erledigt_sind() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());
    p.beitreten("bob", "b.example");

    p.befehl("alice", &["register"]);
    p.befehl("bob", &["register"]);
    p.op_erhalten();
    p.ban_bestaetigen("*!alice@a.example");
    p.ban_bestaetigen("*!bob@b.example");
    p.ausgang_nehmen();

    // Nur alice ist faellig: Privileg bleibt fuer bob
    p.vorspulen(20);
    p.modus("op", false, 'b', "*!alice@a.example");
    assert!(p.ausgang_nehmen().is_empty());
    assert!(p.waechter.borrow().hat_privileg(RAUM));
    assert!(p.konvergiert());

    p.scan();
    assert_eq!(
        p.ausgang_nehmen(),
        vec![
            modus_befehl("-b *!bob@b.example"),
            roh("CHANSERV DEOP #chat"),
        ]
    );
    assert!(p.konvergiert());
}

#[test]
fn kick_findet_wiedergekehrten_teilnehmer_ueber_identitaet() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());

    p.befehl("alice", &["register"]);
    p.op_erhalten();
    p.ausgang_nehmen();

    // Verbindung neu aufgebaut: neue ID, anderer Name, gleiche Identitaet
    p.presence.beendet("alice");
    p.presence
        .beigetreten("alice_zurueck", identitaet("alice@a.example"), RAUM);

    p.ban_bestaetigen("*!alice@a.example");
    match p.ausgang_nehmen().as_slice() {
        [AusgehenderBefehl::Kick { name, .. }] => assert_eq!(name, "alice_zurueck"),
        anders => panic!("Kick erwartet: {anders:?}"),
    }
}

#[test]
fn unbestaetigter_ban_wird_vom_scan_wiederholt() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());

    p.befehl("alice", &["register"]);
    p.op_erhalten();
    assert!(p.ausgang_nehmen().contains(&modus_befehl("+b *!alice@a.example")));

    // Server verwirft den Ban; der naechste Scan fordert ihn erneut an
    p.vorspulen(60);
    p.scan();
    assert_eq!(p.ausgang_nehmen(), vec![modus_befehl("+b *!alice@a.example")]);
    assert!(p.waechter.borrow().hat_privileg(RAUM));

    // Jetzt kommt die Bestaetigung: Kick wie gewohnt
    p.ban_bestaetigen("*!alice@a.example");
    assert!(matches!(
        p.ausgang_nehmen().as_slice(),
        [AusgehenderBefehl::Kick { .. }]
    ));
    assert_eq!(p.waechter.borrow().anzahl_ausstehend(), 0);
    assert!(p.konvergiert());
}

#[test]
fn erneuter_ausloeser_wiederholt_unbestaetigten_ban() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());

    p.befehl("alice", &["register"]);
    p.op_erhalten();
    p.ausgang_nehmen();

    p.befehl("alice", &["register"]);
    assert_eq!(
        p.ausgang_nehmen(),
        vec![
            nachricht("alice: Please wait, processing your request."),
            modus_befehl("+b *!alice@a.example"),
        ]
    );
}

#[test]
fn nie_bestaetigter_ban_wird_verworfen_und_privileg_abgegeben() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());

    p.befehl("alice", &["register"]);
    p.op_erhalten();
    p.ausgang_nehmen();

    // Versuch 1 beim Privileg, 2 und 3 per Scan
    for _ in 0..2 {
        p.vorspulen(60);
        p.scan();
        assert_eq!(p.ausgang_nehmen(), vec![modus_befehl("+b *!alice@a.example")]);
    }

    p.vorspulen(60);
    p.scan();
    assert_eq!(p.ausgang_nehmen(), vec![roh("CHANSERV DEOP #chat")]);
    assert!(p
        .waechter
        .borrow()
        .zustand(RAUM, &identitaet("alice@a.example"))
        .is_none());
    assert!(!p.waechter.borrow().hat_privileg(RAUM));
    assert!(p.konvergiert());
}

#[test]
fn privileg_verloren_mit_offener_arbeit_wird_neu_angefordert() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());
    p.befehl("alice", &["register"]);
    p.op_erhalten();
    p.ban_bestaetigen("*!alice@a.example");
    p.ausgang_nehmen();

    // Jemand nimmt dem Bot das Privileg, der Ban laeuft noch
    p.modus("op", false, 'o', BOT);
    assert_eq!(p.ausgang_nehmen(), vec![roh("CHANSERV OP #chat")]);
    assert!(!p.waechter.borrow().hat_privileg(RAUM));
    assert_eq!(p.waechter.borrow().wiederherstellungen().len(), 1);

    // Privileg zurueck vor der Frist: nichts zu tun, aber gehalten
    p.op_erhalten();
    assert!(p.ausgang_nehmen().is_empty());
    assert!(p.waechter.borrow().hat_privileg(RAUM));
    assert!(p.konvergiert());

    p.vorspulen(20);
    p.scan();
    assert_eq!(
        p.ausgang_nehmen(),
        vec![
            modus_befehl("-b *!alice@a.example"),
            roh("CHANSERV DEOP #chat"),
        ]
    );
    assert!(p.konvergiert());
}

#[test]
fn knockout_ziel_ohne_gross_kleinschreibung() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = vorbereiten(dir.path());

    p.befehl("op", &["knockout", "ALICE"]);
    assert_eq!(
        p.ausgang_nehmen(),
        vec![
            nachricht("op: Please wait, processing your request."),
            roh("CHANSERV OP #chat"),
        ]
    );
    match p.waechter.borrow().zustand(RAUM, &identitaet("alice@a.example")) {
        Some(ModerationsZustand::Ausstehend(k)) => assert_eq!(k.name, "alice"),
        anders => panic!("Knockout erwartet, gefunden: {anders:?}"),
    };
}
