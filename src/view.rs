use my_arbolitos::models::{HealthBand, PlantAnalysis, PlantHistory};
use my_arbolitos::summary::{HistorySummary, Insight, InsightKind};

pub fn print_analysis(analysis: &PlantAnalysis) {
    let m = &analysis.analysis;
    println!(
        "Planta: '{}'\nFecha: {}\nSalud: {}/100 ({})",
        analysis.plant_id,
        analysis.timestamp.to_rfc3339(),
        m.overall_health_score,
        HealthBand::from_score(m.overall_health_score).label(),
    );
    println!(
        "  Volumen de flores: {}\n  Densidad de flores: {}\n  Color: {}\n  Hojas: {}\n  Estrés: {}\n  Estructura: {}\n  Tricomas: {}",
        m.flower_volume,
        m.flower_density,
        m.color_health,
        m.leaf_condition,
        m.stress_signs,
        m.general_structure,
        m.trichome_development,
    );
    match &analysis.changes_detected {
        Some(changes) => println!(
            "Cambios ({}):\n  {}\n  {}\n  {}",
            changes.health_trend.as_str().to_uppercase(),
            changes.growth_change,
            changes.density_change,
            changes.color_change,
        ),
        None => println!("Cambios: primer análisis de esta planta"),
    }
}

pub fn print_plant_list(plants: &[PlantHistory]) {
    if plants.is_empty() {
        println!("No se encontraron plantas. Analiza tu primera foto para empezar.");
        return;
    }
    println!("Tus plantas ({})", plants.len());
    for plant in plants {
        println!("Nombre: '{}'\nID: '{}'", plant.display_name(), plant.plant_id);
        match plant.latest() {
            Some(latest) => println!(
                "  Salud: {}/100 ({})\n  Análisis: {}\n  Última actualización: {}",
                latest.score(),
                HealthBand::from_score(latest.score()).label(),
                plant.analyses.len(),
                latest.timestamp.format("%Y-%m-%d"),
            ),
            None => println!("  Análisis: Ninguno"),
        }
        println!();
    }
}

pub fn print_timeline(history: &PlantHistory) {
    println!("Línea de tiempo: {}", history.display_name());
    if history.analyses.is_empty() {
        println!("Análisis: Ninguno");
        return;
    }
    for (i, analysis) in history.analyses.iter().enumerate() {
        let m = &analysis.analysis;
        println!(
            "  Análisis {}:\n    Fecha: {}\n    Salud: {}/100\n    Volumen de flores: {}\n    Densidad de flores: {}\n    Hojas: {}",
            i + 1,
            analysis.timestamp.to_rfc3339(),
            m.overall_health_score,
            m.flower_volume,
            m.flower_density,
            m.leaf_condition,
        );
        if let Some(changes) = &analysis.changes_detected {
            println!("    Cambios: {}", changes.health_trend.as_str().to_uppercase());
        }
    }
}

/// Infos shown after the warnings.
const MAX_INFOS: usize = 5;

pub fn print_summary(summary: &HistorySummary, history: &PlantHistory, insights: &[Insight]) {
    println!("Resumen de {} días: {}", summary.period_days, summary.plant_name);
    println!("Período hasta: {}", summary.period_end.format("%Y-%m-%d"));
    println!("  Análisis: {}", summary.analyses);
    match summary.average_score {
        Some(average) => println!("  Salud promedio: {:.1}/100", average),
        None => println!("  Salud promedio: sin datos"),
    }
    if let Some(latest) = summary.latest_score {
        println!("  Última salud: {}/100 ({})", latest, HealthBand::from_score(latest).label());
    }
    if let Some(change) = summary.score_change(history) {
        println!("  Cambio en el período: {:+}", change);
    }
    println!(
        "  Tendencias: {} mejoró, {} estable, {} empeoró",
        summary.improved, summary.stable, summary.worse
    );

    if insights.is_empty() {
        return;
    }
    println!("Observaciones:");
    let infos = insights.iter().filter(|i| i.kind == InsightKind::Info).take(MAX_INFOS);
    for insight in insights.iter().filter(|i| i.kind == InsightKind::Warning).chain(infos) {
        let mark = match insight.kind {
            InsightKind::Warning => "!",
            InsightKind::Info => "-",
        };
        println!("  {} {}", mark, insight.message);
    }
}
